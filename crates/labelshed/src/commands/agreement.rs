use clap::Parser;
use comfy_table::{presets, Row, Table};
use interchange::{agreement, AgreementRequest, Method};

use crate::prelude::*;

/// Compute the inter-annotator agreement of the labelshed.
#[derive(Debug, Parser)]
pub(crate) struct Agreement {
    /// The agreement measure, either "cohen" (two users) or "fleiss"
    /// (two or more users).
    #[arg(short, long, default_value = "cohen")]
    method: Method,

    /// The names of the users to compare.
    #[arg(short, long = "user", required = true)]
    users: Vec<String>,

    /// Print the result as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

impl Agreement {
    pub(crate) fn execute(self) -> LabelshedResult<()> {
        let labelshed = Labelshed::discover()?;
        let config = labelshed.config()?;
        let store = labelshed.store(&config)?;

        let request = AgreementRequest {
            method: self.method,
            users: self
                .users
                .iter()
                .map(|username| config.user_id(username))
                .collect::<LabelshedResult<Vec<_>>>()?,
        };

        let report = agreement(&store, config.project.id, &request)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_header(Row::from(vec![
            "method",
            "users",
            "kappa",
            "interpretation",
        ]));
        table.add_row(vec![
            report.method.to_string(),
            self.users.join(", "),
            format!("{:.4}", report.kappa),
            report.interpretation().to_string(),
        ]);

        println!("{table}");
        Ok(())
    }
}
