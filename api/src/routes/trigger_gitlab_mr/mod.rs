pub mod trigger_gitlab_mr_route;
