pub mod cli;
pub mod collate;
pub mod config;
pub mod enrollment;
pub mod fetch;
pub mod github;
pub mod hashing;
pub mod logging;
pub mod notebook;
pub mod report;
pub mod roster;
pub mod similarity;
pub mod survey;
pub mod text;
