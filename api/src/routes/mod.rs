pub mod health;
pub mod trigger_gitlab_mr;
