//! cragbot core data access
//!
//! Clients and domain helpers shared by the cragbot interaction server.
//!
//! # Architecture
//!
//! - [`OpenBetaApi`] / [`DefaultOpenBeta`] fetch climb and area details from
//!   the OpenBeta GraphQL API
//! - [`SearchIndex`] / [`TypesenseClient`] run multi-search queries against
//!   the Typesense index backing autocomplete
//! - [`discipline`] maps climbing disciplines to labels and icons
//!
//! Both clients sit behind object-safe traits so the server can swap in
//! fakes under test.

pub mod discipline;
mod error;
pub mod openbeta;
pub mod typesense;

pub use discipline::{Discipline, DisciplineFlags};
pub use error::CoreError;
pub use openbeta::{Area, Climb, DefaultOpenBeta, OpenBetaApi};
pub use typesense::{
    AreaDocument, ClimbDocument, SearchIndex, SearchRequest, TypesenseClient, TypesenseConfig,
    parse_documents,
};
