use clap::Parser;
use comfy_table::{presets, Row, Table};
use interchange::progress;

use crate::prelude::*;

/// Show the annotation progress of every user.
#[derive(Debug, Default, Parser)]
pub(crate) struct Status {}

impl Status {
    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let labelshed = Labelshed::discover()?;
        let config = labelshed.config()?;
        let store = labelshed.store(&config)?;

        let mut table = Table::new();
        table.set_header(Row::from(vec![
            "user",
            "total",
            "completed",
            "pending",
        ]));
        table.load_preset(presets::UTF8_FULL_CONDENSED);

        for (username, user) in config.users.iter() {
            let progress = progress(&store, config.project.id, user.id)?;
            table.add_row(vec![
                username.clone(),
                progress.total.to_string(),
                progress.completed.to_string(),
                progress.pending.to_string(),
            ]);
        }

        eprintln!(
            "labelshed '{}', version {} ({}, {} label(s)).\n",
            config.metadata.name,
            config.metadata.version,
            config.project.category,
            config.project.labels.len(),
        );

        if table.is_empty() {
            println!("No users yet, add one with `labelshed user add`.");
        } else {
            println!("{table}");
        }

        Ok(())
    }
}
