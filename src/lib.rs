pub mod captions;
pub mod config;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod holiday;
pub mod mode;
pub mod scan;
pub mod settings;
pub mod synthesis;

pub mod platform {
    pub mod installer;
    pub mod processes;
    pub mod screens;
    pub mod shell;
}

pub mod processing {
    pub mod brightness;
    pub mod compose;
    pub mod layout;
    pub mod overlay;
    pub mod text;
}

pub mod tasks {
    pub mod scheduler;
}
