//! Personal-finance simulation core: compound interest projections,
//! inflation adjustment, retirement planning, goal solving, scenario and
//! Monte Carlo analysis, served over a small JSON API.

pub mod api;
pub mod core;
pub mod error;
pub mod logging;
