//! Session lifecycle tests against a manually driven clock.

use std::sync::Arc;
use std::thread;

use chrono::Duration;
use warden::{ManualClock, Warden, WardenConfig, WardenError};

fn warden_with_clock() -> (Arc<ManualClock>, Warden) {
    let clock = Arc::new(ManualClock::starting_now());
    let config = WardenConfig::default().pbkdf2_iterations(1_000);
    let warden = Warden::with_clock(config, clock.clone()).expect("valid config");
    (clock, warden)
}

#[test]
fn login_then_validate_returns_owner() -> Result<(), WardenError> {
    let (_clock, warden) = warden_with_clock();
    let alice = warden.create_user("alice", "secret123", "uploader")?;

    let session = warden.login("alice", "secret123")?;
    assert_eq!(session.user_id, alice.id);

    let resolved = warden.validate_session(session.token.as_str())?;
    assert_eq!(resolved.id, alice.id);
    assert_eq!(resolved.username, "alice");
    Ok(())
}

#[test]
fn session_expires_after_a_day_and_is_purged() -> Result<(), WardenError> {
    let (clock, warden) = warden_with_clock();
    warden.create_user("alice", "secret123", "uploader")?;
    let session = warden.login("alice", "secret123")?;
    let token = session.token.as_str();

    clock.advance(Duration::hours(24) - Duration::seconds(1));
    assert!(warden.validate_session(token).is_ok());

    clock.advance(Duration::seconds(1));
    assert_eq!(warden.validate_session(token), Err(WardenError::SessionExpired));

    // Expired sessions are removed on detection.
    assert_eq!(warden.validate_session(token), Err(WardenError::InvalidCredentials));
    assert_eq!(warden.session_count(), 0);
    Ok(())
}

#[test]
fn logout_invalidates_and_is_idempotent() -> Result<(), WardenError> {
    let (_clock, warden) = warden_with_clock();
    warden.create_user("alice", "secret123", "uploader")?;
    let session = warden.login("alice", "secret123")?;
    let token = session.token.as_str();

    warden.logout(token);
    assert_eq!(warden.validate_session(token), Err(WardenError::InvalidCredentials));

    warden.logout(token);
    warden.logout("never-issued");
    assert_eq!(warden.session_count(), 0);
    Ok(())
}

#[test]
fn logout_leaves_other_sessions_alone() -> Result<(), WardenError> {
    let (_clock, warden) = warden_with_clock();
    warden.create_user("alice", "secret123", "uploader")?;
    let laptop = warden.login("alice", "secret123")?;
    let phone = warden.login("alice", "secret123")?;

    warden.logout(laptop.token.as_str());
    assert!(warden.validate_session(phone.token.as_str()).is_ok());
    Ok(())
}

#[test]
fn wrong_password_and_unknown_user_are_indistinguishable() -> Result<(), WardenError> {
    let (_clock, warden) = warden_with_clock();
    warden.create_user("alice", "secret123", "uploader")?;

    let wrong_password = warden.login("alice", "wrongpass");
    let unknown_user = warden.login("mallory", "secret123");

    assert_eq!(wrong_password, Err(WardenError::InvalidCredentials));
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(
        wrong_password.unwrap_err().to_string(),
        unknown_user.unwrap_err().to_string()
    );
    Ok(())
}

#[test]
fn failed_login_creates_no_session() -> Result<(), WardenError> {
    let (_clock, warden) = warden_with_clock();
    warden.create_user("alice", "secret123", "uploader")?;
    let before = warden.session_count();

    let _ = warden.login("alice", "wrongpass");
    let _ = warden.login("nobody", "wrongpass");
    let _ = warden.login("", "");

    assert_eq!(warden.session_count(), before);
    Ok(())
}

#[test]
fn unknown_token_is_invalid_credentials() {
    let (_clock, warden) = warden_with_clock();
    assert_eq!(
        warden.validate_session("deadbeef"),
        Err(WardenError::InvalidCredentials)
    );
    assert_eq!(warden.validate_session(""), Err(WardenError::InvalidCredentials));
}

#[test]
fn deleted_owner_invalidates_session() -> Result<(), WardenError> {
    let (_clock, warden) = warden_with_clock();
    let alice = warden.create_user("alice", "secret123", "uploader")?;
    let session = warden.login("alice", "secret123")?;

    warden.delete_user(&alice.id)?;
    assert_eq!(
        warden.validate_session(session.token.as_str()),
        Err(WardenError::InvalidCredentials)
    );
    assert_eq!(warden.session_count(), 0);
    assert_eq!(
        warden.login("alice", "secret123"),
        Err(WardenError::InvalidCredentials)
    );
    Ok(())
}

#[test]
fn purge_does_not_change_validation_outcomes() -> Result<(), WardenError> {
    let (clock, warden) = warden_with_clock();
    warden.create_user("alice", "secret123", "uploader")?;
    let stale = warden.login("alice", "secret123")?;
    clock.advance(Duration::hours(23));
    let fresh = warden.login("alice", "secret123")?;
    clock.advance(Duration::hours(2));

    assert_eq!(warden.purge_expired(), 1);
    assert_eq!(warden.purge_expired(), 0);

    // Swept or not, an expired token reports expiry first, then nothing.
    assert_eq!(
        warden.validate_session(stale.token.as_str()),
        Err(WardenError::SessionExpired)
    );
    assert_eq!(
        warden.validate_session(stale.token.as_str()),
        Err(WardenError::InvalidCredentials)
    );
    assert!(warden.validate_session(fresh.token.as_str()).is_ok());
    Ok(())
}

#[test]
fn swept_and_unswept_tokens_validate_alike() -> Result<(), WardenError> {
    let clock = Arc::new(ManualClock::starting_now());
    let config = WardenConfig::default().pbkdf2_iterations(1_000);
    let swept = Warden::with_clock(config.clone(), clock.clone())?;
    let unswept = Warden::with_clock(config, clock.clone())?;

    let mut outcomes = Vec::new();
    for warden in [&swept, &unswept] {
        warden.create_user("alice", "secret123", "uploader")?;
        let session = warden.login("alice", "secret123")?;
        clock.advance(Duration::hours(25));
        if std::ptr::eq(warden, &swept) {
            assert_eq!(warden.purge_expired(), 1);
        }
        let token = session.token.as_str();
        outcomes.push((warden.validate_session(token), warden.validate_session(token)));
    }

    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(
        outcomes[0],
        (Err(WardenError::SessionExpired), Err(WardenError::InvalidCredentials))
    );
    Ok(())
}

#[test]
fn concurrent_logins_mint_distinct_tokens() -> Result<(), WardenError> {
    let (_clock, warden) = warden_with_clock();
    warden.create_user("alice", "secret123", "uploader")?;
    let warden = Arc::new(warden);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let warden = Arc::clone(&warden);
            thread::spawn(move || warden.login("alice", "secret123"))
        })
        .collect();

    let mut tokens = Vec::new();
    for handle in handles {
        let session = handle.join().expect("login thread panicked")?;
        tokens.push(session.token.as_str().to_string());
    }
    tokens.sort();
    tokens.dedup();

    assert_eq!(tokens.len(), 8);
    assert_eq!(warden.session_count(), 8);
    for token in &tokens {
        assert!(warden.validate_session(token).is_ok());
    }
    Ok(())
}

#[test]
fn concurrent_signups_for_one_name_admit_exactly_one() {
    let (_clock, warden) = warden_with_clock();
    let warden = Arc::new(warden);

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let warden = Arc::clone(&warden);
            thread::spawn(move || warden.create_user("alice", &format!("secret{i}"), "uploader"))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("signup thread panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == WardenError::UsernameTaken("alice".to_string())));
    assert_eq!(warden.user_count(), 1);
}
