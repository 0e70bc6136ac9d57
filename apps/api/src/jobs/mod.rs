// Job search: provider seam, the Apify/LinkedIn provider, and the fetch policy
// (keyword splitting, per-search row counts, result cap) on top of it.

pub mod apify;
pub mod fetcher;
pub mod handlers;
pub mod models;
