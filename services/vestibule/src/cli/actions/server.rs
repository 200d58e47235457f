use crate::api;
use crate::flow::{FlowConfig, FlowState, ProviderRegistry, StaticProvider};
use crate::store::memory::{MemoryDocumentStore, MemorySessionStore};
use crate::store::LogNotifier;
use anyhow::{anyhow, Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use ceremony::CeremonyNode;
use flow_token::SigningKeys;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, sync::Arc};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub issuer: String,
    pub signing_seed: Option<SecretString>,
    pub ceremony_path: String,
    pub frontend_base_url: String,
    pub ceremony_ttl: Duration,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Ceremony definition file: the tree(s) plus one static provider per
/// component id.
#[derive(Debug, Deserialize)]
struct CeremonyFile {
    ceremony: CeremonyNode,
    #[serde(default)]
    registration: Option<CeremonyNode>,
    components: BTreeMap<String, ComponentEntry>,
}

#[derive(Debug, Deserialize)]
struct ComponentEntry {
    prompt: String,
    #[serde(default)]
    secret: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the ceremony file or signing seed is invalid, or the
/// server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let definition = load_ceremony_file(&args.ceremony_path)?;
    let keys = Arc::new(signing_keys(args.signing_seed.as_ref())?);

    let mut config = FlowConfig::new(&definition.ceremony, &args.issuer)
        .with_ceremony_ttl(args.ceremony_ttl)
        .with_access_ttl(args.access_ttl)
        .with_refresh_ttl(args.refresh_ttl);
    if let Some(registration) = &definition.registration {
        config = config.with_registration_ceremony(registration);
    }

    let mut registry = ProviderRegistry::new();
    for (component_id, entry) in definition.components {
        let mut provider = StaticProvider::new(&component_id, &entry.prompt);
        if let Some(secret) = entry.secret {
            provider = provider.with_secret(secret);
        }
        registry = registry.register(component_id, Arc::new(provider));
    }

    let flow = FlowState::new(
        config,
        registry,
        keys,
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(LogNotifier),
    )
    .map_err(|err| anyhow!("Invalid ceremony configuration: {err}"))?;

    info!(
        issuer = %args.issuer,
        ceremony = %args.ceremony_path,
        "Starting vestibule"
    );

    api::new(args.port, &args.frontend_base_url, Arc::new(flow)).await
}

fn load_ceremony_file(path: &str) -> Result<CeremonyFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ceremony file: {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid ceremony file: {path}"))
}

fn signing_keys(seed: Option<&SecretString>) -> Result<SigningKeys> {
    let Some(seed) = seed else {
        warn!("No signing seed configured; tokens will not survive a restart");
        return SigningKeys::generate().map_err(|err| anyhow!("Key generation failed: {err}"));
    };

    let decoded = Base64UrlUnpadded::decode_vec(seed.expose_secret())
        .map_err(|_| anyhow!("Signing seed is not valid base64url"))?;
    let seed: [u8; 32] = decoded
        .try_into()
        .map_err(|_| anyhow!("Signing seed must decode to exactly 32 bytes"))?;
    SigningKeys::from_seed(&seed).map_err(|err| anyhow!("Invalid signing seed: {err}"))
}
