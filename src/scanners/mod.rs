pub mod dex_screener;
pub mod gecko_terminal;
pub mod profile_posts;
