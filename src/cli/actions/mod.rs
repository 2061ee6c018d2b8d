pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        realm: String,
        auth_method: String,
        login_page: Option<String>,
        error_page: Option<String>,
        users: Vec<String>,
        protect: Vec<String>,
        roles: Vec<String>,
        digest_algorithm: String,
        random_source: String,
        entropy: Option<String>,
        identity_cache: bool,
        suppress_proxy_caching: bool,
        sso: bool,
    },
}
