//! Headless back-office console.
//!
//! Restores the persisted session or logs in with `TOURDESK_IDENTIFIER` /
//! `TOURDESK_SECRET`, then lists the resources given on the command line
//! (default `/dossiers`) and keeps the session refreshed until Ctrl-C.
//!
//! ```text
//! TOURDESK_BASE_URL=https://api.agence.tn/v1 \
//! TOURDESK_STORAGE_DIR=.tourdesk \
//! TOURDESK_IDENTIFIER=amina@agence.tn TOURDESK_SECRET=... \
//!     cargo run -p agency-console -- /dossiers /hotels
//! ```

use tourdesk::prelude::*;

fn credentials_from_env() -> Option<Credentials> {
    let identifier = std::env::var("TOURDESK_IDENTIFIER").ok()?;
    let secret = std::env::var("TOURDESK_SECRET").ok()?;
    Some(Credentials::new(identifier, secret))
}

#[tokio::main]
async fn main() -> Result<(), TourdeskError> {
    tourdesk::init_tracing();

    let office = BackOffice::builder()
        .config(ClientConfig::from_env()?)
        .navigator(|path: &str| println!("-> please sign in again at {path}"))
        .build()?;

    let session = match office.restore()? {
        Some(session) => session,
        None => {
            let Some(credentials) = credentials_from_env() else {
                eprintln!("no stored session; set TOURDESK_IDENTIFIER and TOURDESK_SECRET");
                return Ok(());
            };
            office.session().login(&credentials).await?
        }
    };
    println!(
        "signed in as {} (agency: {})",
        session.role(),
        session.agency_scope().map_or("all", |a| a.as_str())
    );

    let mut paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        paths.push("/dossiers".to_owned());
    }
    for path in &paths {
        let result = office
            .session()
            .intercept(office.api().get_json::<serde_json::Value>(path).await);
        match result {
            Ok(body) => println!("{path}: {body:#}"),
            Err(e) => {
                tracing::warn!(%path, error = %e, "request failed");
                if !office.context().is_authenticated() {
                    return Ok(());
                }
            }
        }
    }

    let mut events = office.session().events();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(SessionEvent::Refreshed) => tracing::info!("token refreshed"),
                Ok(SessionEvent::SessionExpired) => break,
                Ok(other) => tracing::debug!(?other, "session event"),
                Err(e) => tracing::debug!(error = %e, "event stream lagged or closed"),
            },
        }
    }
    Ok(())
}
