use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let strings = |id: &str| -> Vec<String> {
        matches
            .get_many::<String>(id)
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    };

    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        realm: matches
            .get_one::<String>("realm")
            .cloned()
            .unwrap_or_else(|| "Gardisto".to_string()),
        auth_method: matches
            .get_one::<String>("auth-method")
            .cloned()
            .unwrap_or_else(|| "BASIC".to_string()),
        login_page: matches.get_one::<String>("login-page").cloned(),
        error_page: matches.get_one::<String>("error-page").cloned(),
        users: strings("user"),
        protect: strings("protect"),
        roles: strings("role"),
        digest_algorithm: matches
            .get_one::<String>("digest-algorithm")
            .cloned()
            .unwrap_or_else(|| "MD5".to_string()),
        random_source: matches
            .get_one::<String>("random-source")
            .cloned()
            .unwrap_or_else(|| "chacha20".to_string()),
        entropy: matches.get_one::<String>("entropy").cloned(),
        identity_cache: !matches.get_flag("no-identity-cache"),
        suppress_proxy_caching: !matches.get_flag("allow-proxy-caching"),
        sso: matches.get_flag("sso"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_defaults() {
        let matches = commands::new().get_matches_from(vec!["gardisto"]);
        let action = handler(&matches).unwrap();

        let Action::Server {
            port,
            realm,
            auth_method,
            protect,
            identity_cache,
            suppress_proxy_caching,
            sso,
            ..
        } = action;

        assert_eq!(port, 8080);
        assert_eq!(realm, "Gardisto");
        assert_eq!(auth_method, "BASIC");
        assert_eq!(protect, ["/secure/*"]);
        assert!(identity_cache);
        assert!(suppress_proxy_caching);
        assert!(!sso);
    }

    #[test]
    fn test_handler_flags() {
        let matches = commands::new().get_matches_from(vec![
            "gardisto",
            "--no-identity-cache",
            "--allow-proxy-caching",
            "--sso",
            "--role",
            "admin",
        ]);
        let action = handler(&matches).unwrap();

        let Action::Server {
            roles,
            identity_cache,
            suppress_proxy_caching,
            sso,
            ..
        } = action;

        assert_eq!(roles, ["admin"]);
        assert!(!identity_cache);
        assert!(!suppress_proxy_caching);
        assert!(sso);
    }
}
