use super::*;

#[test]
fn password_check() {
    let auth = AuthService::new("hunter2".to_string());

    assert!(auth.check_password("hunter2"));
    assert!(!auth.check_password("hunter3"));
    assert!(!auth.check_password(""));
    assert!(!auth.check_password("hunter2 "));
}

#[test]
fn issued_token_verifies() {
    let mut auth = AuthService::new("pw".to_string());

    let token = auth.issue_token();
    assert!(auth.verify(&token));
    assert!(!auth.verify("not-a-token"));
}

#[test]
fn tokens_are_unique() {
    let mut auth = AuthService::new("pw".to_string());

    let first = auth.issue_token();
    let second = auth.issue_token();
    assert_ne!(first, second);
    assert!(auth.verify(&first));
    assert!(auth.verify(&second));
}

#[test]
fn expired_token_rejected() {
    let mut auth = AuthService::new("pw".to_string()).with_token_lifetime(Duration::hours(-1));

    let token = auth.issue_token();
    assert!(!auth.verify(&token));
}

#[test]
fn revoke_expired_drops_stale_sessions() {
    let mut auth = AuthService::new("pw".to_string()).with_token_lifetime(Duration::hours(-1));
    let stale = auth.issue_token();

    auth = auth.with_token_lifetime(Duration::hours(1));
    let fresh = auth.issue_token();

    auth.revoke_expired();
    assert!(!auth.verify(&stale));
    assert!(auth.verify(&fresh));
}
