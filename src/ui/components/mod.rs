pub mod plan_card;
pub mod progress_bar;
pub mod typing_area;
