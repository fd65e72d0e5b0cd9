pub mod errors;
pub mod db;
pub mod monitoring_tool;
pub mod external_link;
pub mod external_link_cluster;
pub mod self_registration_role;
pub mod app_user;
pub mod app_user_role;
