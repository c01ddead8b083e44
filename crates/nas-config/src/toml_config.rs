use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use toml::Value;

use super::mme_config::{default_workers, CfgNetwork, CfgPdn, CfgSecurity, CfgTimers, MmeConfig, MmeState, SharedConfig};

/// Build `SharedConfig` from a TOML configuration file
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    let expected_config_version = "0.1";
    if !root.config_version.eq(expected_config_version) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, expected_config_version
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if !root.network.extra.is_empty() {
        return Err(format!("Unrecognized fields in network: {:?}", sorted_keys(&root.network.extra)).into());
    }
    if let Some(ref pdn) = root.pdn {
        if !pdn.extra.is_empty() {
            return Err(format!("Unrecognized fields in pdn: {:?}", sorted_keys(&pdn.extra)).into());
        }
    }
    if let Some(ref sec) = root.security {
        if !sec.extra.is_empty() {
            return Err(format!("Unrecognized fields in security: {:?}", sorted_keys(&sec.extra)).into());
        }
    }
    if let Some(ref t) = root.timers {
        if !t.extra.is_empty() {
            return Err(format!("Unrecognized fields in timers: {:?}", sorted_keys(&t.extra)).into());
        }
    }

    // Build config from required and optional values
    let net = root.network;
    let mut cfg = MmeConfig {
        debug_log: root.debug_log,
        workers: root.workers.unwrap_or_else(default_workers),
        network: CfgNetwork {
            mcc: net.mcc,
            mnc: net.mnc,
            mme_group: net.mme_group,
            mme_code: net.mme_code,
            tac: net.tac,
            full_network_name: net.full_network_name.unwrap_or_else(|| "NAS Network".to_string()),
            short_network_name: net.short_network_name.unwrap_or_else(|| "NAS".to_string()),
        },
        pdn: CfgPdn::default(),
        security: CfgSecurity::default(),
        timers: CfgTimers::default(),
    };

    if let Some(pdn) = root.pdn {
        apply_pdn_patch(&mut cfg.pdn, pdn)?;
    }
    if let Some(sec) = root.security {
        apply_security_patch(&mut cfg.security, sec)?;
    }
    if let Some(t) = root.timers {
        apply_timers_patch(&mut cfg.timers, t);
    }

    Ok(SharedConfig::from_parts(cfg, MmeState::default())?)
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

fn apply_pdn_patch(dst: &mut CfgPdn, src: PdnDto) -> Result<(), String> {
    if let Some(apn) = src.apn {
        dst.apn = apn;
    }
    if let Some(dns) = src.dns {
        dst.dns = dns
            .parse::<Ipv4Addr>()
            .map_err(|e| format!("pdn.dns: invalid IPv4 address {:?}: {}", dns, e))?;
    }
    Ok(())
}

fn apply_security_patch(dst: &mut CfgSecurity, src: SecurityDto) -> Result<(), String> {
    if let Some(list) = src.integrity {
        dst.integrity = parse_alg_list(&list, "EIA")?;
    }
    if let Some(list) = src.ciphering {
        dst.ciphering = parse_alg_list(&list, "EEA")?;
    }
    if let Some(v) = src.allow_guti_attach_without_auth {
        dst.allow_guti_attach_without_auth = v;
    }
    Ok(())
}

/// Parses names like "EIA2" into their 3-bit identifier
fn parse_alg_list(names: &[String], prefix: &str) -> Result<Vec<u8>, String> {
    names
        .iter()
        .map(|name| {
            let upper = name.to_ascii_uppercase();
            upper
                .strip_prefix(prefix)
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| *n <= 7)
                .ok_or_else(|| format!("Unknown algorithm {:?}, expected {}0..{}7", name, prefix, prefix))
        })
        .collect()
}

fn apply_timers_patch(dst: &mut CfgTimers, t: TimersDto) {
    if let Some(v) = t.t3413_ms {
        dst.t3413 = Duration::from_millis(v);
    }
    if let Some(v) = t.t3422_ms {
        dst.t3422 = Duration::from_millis(v);
    }
    if let Some(v) = t.t3450_ms {
        dst.t3450 = Duration::from_millis(v);
    }
    if let Some(v) = t.t3460_ms {
        dst.t3460 = Duration::from_millis(v);
    }
    if let Some(v) = t.t3470_ms {
        dst.t3470 = Duration::from_millis(v);
    }
    if let Some(v) = t.t3489_ms {
        dst.t3489 = Duration::from_millis(v);
    }
    if let Some(v) = t.max_retransmissions {
        dst.max_retransmissions = v;
    }
    if let Some(v) = t.t3412_minutes {
        dst.t3412_minutes = v;
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,
    workers: Option<usize>,

    network: NetworkDto,

    #[serde(default)]
    pdn: Option<PdnDto>,

    #[serde(default)]
    security: Option<SecurityDto>,

    #[serde(default)]
    timers: Option<TimersDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct NetworkDto {
    pub mcc: String,
    pub mnc: String,
    pub mme_group: u16,
    pub mme_code: u8,
    pub tac: u16,
    pub full_network_name: Option<String>,
    pub short_network_name: Option<String>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct PdnDto {
    pub apn: Option<String>,
    pub dns: Option<String>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct SecurityDto {
    pub integrity: Option<Vec<String>>,
    pub ciphering: Option<Vec<String>>,
    pub allow_guti_attach_without_auth: Option<bool>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct TimersDto {
    pub t3413_ms: Option<u64>,
    pub t3422_ms: Option<u64>,
    pub t3450_ms: Option<u64>,
    pub t3460_ms: Option<u64>,
    pub t3470_ms: Option<u64>,
    pub t3489_ms: Option<u64>,
    pub max_retransmissions: Option<u8>,
    pub t3412_minutes: Option<u8>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}
