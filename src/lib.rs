use lazy_static::lazy_static;
use translations::Translations;

pub mod about;
pub mod api_client;
pub mod app;
pub mod chart_view;
pub mod dataset_panel;
pub mod downloads;
pub mod error;
pub mod group_panel;
pub mod notifications;
pub mod numeric;
pub mod pass_groups;
pub mod protocol;
pub mod results_panel;
pub mod session;
pub mod table_data;
pub mod table_panel;
pub mod table_view;
pub mod translations;
pub mod trend_panel;

lazy_static! {
    // Interface translations
    pub static ref TRANSLATIONS: Translations = Translations::default();
}
