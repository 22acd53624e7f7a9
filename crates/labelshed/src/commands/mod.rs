pub(crate) use agreement::Agreement;
pub(crate) use annotate::Annotate;
pub(crate) use completions::Completions;
pub(crate) use config::Config;
pub(crate) use convert::Convert;
pub(crate) use export::Export;
pub(crate) use import::Import;
pub(crate) use init::Init;
pub(crate) use status::Status;
pub(crate) use user::User;
pub(crate) use version::Version;

mod agreement;
mod annotate;
mod completions;
mod config;
mod convert;
mod export;
mod import;
mod init;
mod status;
mod user;
mod version;
