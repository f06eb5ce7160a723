// src/relay/mod.rs
//! Message passing between the page side, the background service and the popup.

pub mod background;
pub mod content;
pub mod messages;
pub mod tab;

pub use background::{
    check_tab, is_job_page, trigger_scrape, watch, BackgroundService, ReadyTabs, TabCheck,
    WATCH_INTERVAL,
};
pub use content::{AgentHandle, ContentAgent, InstallSlot};
pub use messages::{ContentEvent, ContentRequest, ReplyMode, TabEvent, TabId};
pub use tab::Tab;
