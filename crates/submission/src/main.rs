//! `sumki-relay-check`: push a sample order through the relay.
//!
//! With `SUMKI_RELAY_URL` unset, prints the seller message instead.

use std::sync::Arc;

use anyhow::Context;

use sumki_core::ProductKind;
use sumki_observability::LogFormat;
use sumki_order::{Identity, StepInput, SummaryFormatter, Wizard, WizardStep};
use sumki_submission::{HttpRelay, OrderSession, RelayBridge, SubmissionConfig};

fn sample_inputs() -> Vec<StepInput> {
    vec![
        StepInput::Product {
            product: Some(ProductKind::Bag),
        },
        StepInput::Bag {
            size: Some("M".into()),
            shape: Some("round".into()),
            material: Some("acrylic".into()),
        },
        StepInput::Color {
            color: Some("pink".into()),
            preference: Some("pastel".into()),
        },
        StepInput::Options {
            options: Some(vec!["clasp".into()]),
        },
    ]
}

fn sample_identity() -> Identity {
    Identity::new(0, "Relay").with_last_name("Check")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sumki_observability::init_with(LogFormat::from_env());

    let config = SubmissionConfig::from_env().context("reading submission config")?;

    let Some(relay_config) = config.relay.clone() else {
        tracing::info!("SUMKI_RELAY_URL not set; rendering the sample order only");
        let mut wizard = Wizard::start(Some(sample_identity()));
        for input in sample_inputs() {
            wizard.advance(input).context("building sample order")?;
        }
        let draft = wizard.draft();
        let text = SummaryFormatter::builtin().message(draft, draft.user(), draft.contact());
        println!("{text}");
        return Ok(());
    };

    tracing::info!(endpoint = %relay_config.endpoint, "checking relay");
    let relay = HttpRelay::new(relay_config).context("building relay client")?;
    let bridge = Arc::new(RelayBridge::new(relay).with_identity(sample_identity()));

    let mut session = OrderSession::start(bridge.clone(), &config);
    for input in sample_inputs() {
        session.advance(input).context("building sample order")?;
    }

    let step = session.submit().await.context("submitting sample order")?;
    if step != WizardStep::Success {
        let reason = session
            .wizard()
            .failure()
            .map(|f| f.reason.clone())
            .unwrap_or_default();
        session.close();
        anyhow::bail!("relay check failed: {reason}");
    }

    tracing::info!(mode = ?bridge.last_delivery(), "relay check delivered");
    session.close();
    Ok(())
}
