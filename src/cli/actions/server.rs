use crate::api;
use crate::cli::actions::Action;
use crate::gate::{
    scheme::{AuthScheme, BasicScheme, FormScheme, LoginConfig, BASIC_AUTH, FORM_AUTH},
    AccessControlStage, MemoryRealm, MemorySessionStore, MemorySsoRegistry, SecurityConstraint,
    StageConfig, TraceAuditSink,
};
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        realm,
        auth_method,
        login_page,
        error_page,
        users,
        protect,
        roles,
        digest_algorithm,
        random_source,
        entropy,
        identity_cache,
        suppress_proxy_caching,
        sso,
    } = action;

    let mut memory_realm = MemoryRealm::new(realm);

    for user in &users {
        let (name, password, user_roles) = parse_user(user)?;
        memory_realm = memory_realm.with_user(name, password, user_roles);
    }

    for pattern in &protect {
        let constraint = if roles.is_empty() {
            SecurityConstraint::new(pattern).with_auth()
        } else {
            SecurityConstraint::new(pattern).with_roles(roles.clone())
        };
        memory_realm = memory_realm.with_constraint(constraint);
    }

    let mut config = StageConfig::new()
        .with_algorithm(digest_algorithm)
        .with_random_source(random_source)
        .with_cache(identity_cache)
        .with_disable_proxy_caching(suppress_proxy_caching);

    if let Some(entropy) = entropy {
        config = config.with_entropy(entropy);
    }

    let auth_method = auth_method.to_uppercase();

    let mut login = LoginConfig::new(&auth_method);
    if let Some(page) = login_page {
        login = login.with_login_page(page);
    }
    if let Some(page) = error_page {
        login = login.with_error_page(page);
    }

    let scheme: Arc<dyn AuthScheme> = match auth_method.as_str() {
        BASIC_AUTH => Arc::new(BasicScheme),
        FORM_AUTH => Arc::new(FormScheme),
        other => return Err(anyhow!("unsupported authentication scheme: {other}")),
    };

    let mut stage = AccessControlStage::new(
        config,
        login,
        Arc::new(memory_realm),
        Arc::new(MemorySessionStore::new()),
        scheme,
    )?
    .with_audit_sink(Arc::new(TraceAuditSink));

    if sso {
        stage = stage.with_sso(Arc::new(MemorySsoRegistry::new()));
    }

    api::new(port, Arc::new(stage)).await?;

    Ok(())
}

// name:password:role1,role2 with roles optional
fn parse_user(user: &str) -> Result<(String, String, Vec<String>)> {
    let mut parts = user.splitn(3, ':');

    let name = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow!("invalid --user, expected name:password:role1,role2"))?;

    let password = parts
        .next()
        .ok_or_else(|| anyhow!("missing password in --user {name}"))?;

    let roles = parts
        .next()
        .map(|roles| {
            roles
                .split(',')
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok((name.to_string(), password.to_string(), roles))
}
