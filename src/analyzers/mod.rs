pub mod link_extractor;
pub mod sentiment;
pub mod token_analyzer;
