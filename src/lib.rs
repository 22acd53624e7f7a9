//! # Labelshed
//!
//! This project provides tools to move annotation datasets in and out
//! of a labelling project and to measure how well its annotators
//! agree. Datasets are exchanged as plain text, JSON, JSON-Lines, CSV
//! or CoNLL-U files.
//!
//! This project provides the following crates:
//!
//! ## Interchange
//!
//! The `interchange` library converts records between the interchange
//! formats, aligns labelled character spans with word tokens, exports
//! stored annotations and computes Cohen's and Fleiss' Kappa. It
//! doesn't own any persisted data; storage is reached through the
//! `Store` trait.
//!
//! ## Labelshed
//!
//! The `labelshed` tool creates and manages a _labelshed_, a directory
//! holding the project config (`labelshed.toml`) and the imported
//! documents and annotations (`data/*.csv`). It imports and exports
//! datasets, converts files between formats, records annotations and
//! reports the annotation progress and the inter-annotator agreement.
//!
//! ## Contributing
//!
//! All contributors are required to "sign-off" their commits (using
//! `git commit -s`) to indicate that they have agreed to the [Developer
//! Certificate of Origin][DCO].
//!
//! ## License
//!
//! This project is licensed under the terms of the [EUPL v1.2].
//!
//! [DCO]: https://developercertificate.org/
//! [EUPL v1.2]: https://joinup.ec.europa.eu/collection/eupl/eupl-text-eupl-12
