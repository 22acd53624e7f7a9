use interchange::store::UserId;

use crate::config;
use crate::prelude::*;

/// Manage the annotators of the labelshed.
#[derive(Debug, clap::Parser)]
pub(crate) struct User {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, clap::Parser)]
pub(crate) enum Command {
    /// Add a new user to the labelshed. Unless an id is given, the
    /// user gets the next free id.
    Add {
        username: String,

        #[arg(long)]
        id: Option<UserId>,
    },

    /// Remove the user \<username\> from the labelshed.
    #[clap(visible_alias = "rm")]
    Remove { username: String },

    /// List all users of the labelshed.
    #[clap(visible_alias = "ls")]
    List,
}

impl User {
    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let labelshed = Labelshed::discover()?;
        let mut config = labelshed.config()?;

        match self.cmd {
            Command::Add { username, id } => {
                if config.users.contains_key(&username) {
                    bail!("user '{username}' already exist.");
                }

                let id = match id {
                    Some(id) => {
                        if config.users.values().any(|user| user.id == id) {
                            bail!("user id {id} is already taken.");
                        }

                        id
                    }
                    None => {
                        config
                            .users
                            .values()
                            .map(|user| user.id)
                            .max()
                            .unwrap_or_default()
                            + 1
                    }
                };

                log::info!("add user '{username}' with id {id}.");
                config.users.insert(username, config::User { id });
            }
            Command::Remove { username } => {
                if config.users.remove(&username).is_none() {
                    bail!("user '{username}' does not exist.");
                }
            }
            Command::List => {
                for (username, user) in config.users.iter() {
                    println!("{}\t{username}", user.id);
                }

                return Ok(());
            }
        }

        config.save()?;
        Ok(())
    }
}
