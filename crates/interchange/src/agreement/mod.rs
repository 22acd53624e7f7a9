//! Inter-annotator agreement.
//!
//! An agreement request runs through four stages: the request and the
//! referenced users/project are validated, the stored annotations are
//! turned into one rating sequence per user (see [ratings]), the
//! selected coefficient is computed and finally reported. Nothing is
//! cached between requests.

use std::fmt::{self, Display};
use std::str::FromStr;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::error::{bail, InterchangeError, InterchangeResult};
use crate::store::{ProjectId, Store, UserId};

pub mod kappa;
mod ratings;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Cohen,
    Fleiss,
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cohen => write!(f, "cohen"),
            Self::Fleiss => write!(f, "fleiss"),
        }
    }
}

impl FromStr for Method {
    type Err = InterchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cohen" => Ok(Self::Cohen),
            "fleiss" => Ok(Self::Fleiss),
            _ => bail!(InvalidRequest, "invalid method '{s}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgreementRequest {
    pub method: Method,
    #[serde(alias = "userIds")]
    pub users: Vec<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Report {
    pub method: Method,
    pub kappa: f64,
}

impl Report {
    pub fn interpretation(&self) -> &'static str {
        interpret(self.kappa)
    }
}

/// Interprets a kappa value on the Landis & Koch scale.
pub fn interpret(kappa: f64) -> &'static str {
    if kappa < 0.0 {
        "Less than chance agreement"
    } else if kappa < 0.20 {
        "Slight agreement"
    } else if kappa < 0.40 {
        "Fair agreement"
    } else if kappa < 0.60 {
        "Moderate agreement"
    } else if kappa < 0.80 {
        "Substantial agreement"
    } else {
        "Almost perfect agreement"
    }
}

fn validate(
    store: &dyn Store,
    request: &AgreementRequest,
) -> InterchangeResult<()> {
    let count = request.users.len();
    match request.method {
        Method::Cohen if count != 2 => {
            bail!(
                InvalidRequest,
                "Cohen's Kappa requires exactly 2 users, got {count}"
            );
        }
        Method::Fleiss if count < 2 => {
            bail!(
                InvalidRequest,
                "Fleiss' Kappa requires at least 2 users, got {count}"
            );
        }
        _ => {}
    }

    let unique: HashSet<&UserId> = request.users.iter().collect();
    if unique.len() != count {
        bail!(InvalidRequest, "duplicate user ids");
    }

    if store.count_users(&request.users)? != count {
        bail!(NotFound, "one or more users");
    }

    Ok(())
}

/// Computes the agreement of the requested users on `project`.
pub fn agreement(
    store: &dyn Store,
    project: ProjectId,
    request: &AgreementRequest,
) -> InterchangeResult<Report> {
    validate(store, request)?;

    let project = store.project(project)?;
    let documents = store.documents(project.id)?;
    if documents.is_empty() {
        bail!(EmptyResult, "project {} has no documents", project.id);
    }

    let strategy = ratings::strategy(project.category);
    let ratings = strategy.ratings(store, &documents, &request.users)?;

    let kappa = match request.method {
        Method::Cohen => kappa::cohen(&ratings[0], &ratings[1])?,
        Method::Fleiss => {
            let categories = strategy.categories(store, project.id)?;
            kappa::fleiss(&kappa::count_matrix(&categories, &ratings)?)?
        }
    };

    log::info!(
        "{} kappa of users {:?} on project {}: {kappa:.4}",
        request.method,
        request.users,
        project.id
    );

    Ok(Report {
        method: request.method,
        kappa,
    })
}
