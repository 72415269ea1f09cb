//! Scenario configuration loader: parses the `name = value` text format
//! from §6 into an immutable [`ScenarioConfig`] value, or a fatal
//! `ConfigError`.

use std::collections::HashMap;

use crate::error::ConfigError;

/// One fully-parsed, validated scenario — the immutable input the rest of
/// the simulator is built from.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    pub update_interval_s: f64,
    pub end_time_s: f64,
    pub rng_seed: u64,
    pub world_width_m: f64,
    pub world_height_m: f64,
    pub nrof_hosts: u32,
    pub router: RouterKind,
    pub movement_model: MovementModelKind,
    pub nrof_clusters: Option<usize>,
    pub hosts_per_cluster: Option<usize>,
    pub cluster_cell_side_m: Option<f64>,
    pub transmit_range_m: f64,
    pub max_parallel_connections: usize,
    pub churn_rate: f64,
    pub communication_mode: Option<u8>,
    pub generator: GeneratorKind,
    pub message_size_bytes: u64,
    pub event_count_or_cap: u32,
    pub bin_size_m: Option<f64>,
    pub host_range: Option<(u32, u32)>,
    pub to_host_range: Option<(u32, u32)>,
    pub reports: Vec<ReportKind>,
    pub report_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Unified,
    Adjacency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterKind {
    Epidemic,
    SprayAndWait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementModelKind {
    RandomStationaryConstrained,
    RandomStationaryCluster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    ActiveHost,
    StaticHost,
}

fn parse_key_value_lines(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

fn required<'a>(map: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConfigError> {
    map.get(key).map(|s| s.as_str()).ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn parse_num<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str) -> Result<T, ConfigError> {
    required(map, key)?.parse().map_err(|_| ConfigError::Parse { path: "<scenario>".to_string(), line: 0, message: format!("`{key}` is not a valid number") })
}

fn parse_pair<T: std::str::FromStr>(value: &str) -> Option<(T, T)> {
    let mut parts = value.split(',').map(|s| s.trim());
    let a = parts.next()?.parse().ok()?;
    let b = parts.next()?.parse().ok()?;
    Some((a, b))
}

impl ScenarioConfig {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let map = parse_key_value_lines(text);

        let name = required(&map, "Scenario.name")?.to_string();
        let update_interval_s = parse_num(&map, "Scenario.updateInterval")?;
        let end_time_s = parse_num(&map, "Scenario.endTime")?;
        let rng_seed = parse_num(&map, "MovementModel.rngSeed")?;
        let (world_width_m, world_height_m) = parse_pair(required(&map, "MovementModel.worldSize")?)
            .ok_or_else(|| ConfigError::Parse { path: "<scenario>".to_string(), line: 0, message: "`MovementModel.worldSize` must be `W,H`".to_string() })?;

        let nrof_hosts = parse_num(&map, "Group1.nrofHosts")?;

        let router = match required(&map, "Group1.router")? {
            "EpidemicRouter" => RouterKind::Epidemic,
            "SprayAndWaitRouter" => RouterKind::SprayAndWait,
            other => return Err(ConfigError::UnknownClass { kind: "router", name: other.to_string() }),
        };

        let movement_model = match required(&map, "Group1.movementModel")? {
            "RandomStationaryConstrained" => MovementModelKind::RandomStationaryConstrained,
            "RandomStationaryCluster" => MovementModelKind::RandomStationaryCluster,
            other => return Err(ConfigError::UnknownClass { kind: "movementModel", name: other.to_string() }),
        };

        let nrof_clusters = map.get("Group1.nrofClusters").map(|v| v.parse()).transpose().map_err(|_| ConfigError::MissingKey("Group1.nrofClusters".to_string()))?;
        let hosts_per_cluster = map.get("Group1.hostsPerCluster").map(|v| v.parse()).transpose().map_err(|_| ConfigError::MissingKey("Group1.hostsPerCluster".to_string()))?;
        let cluster_cell_side_m = map.get("Group1.clusterCellSide").map(|v| v.parse()).transpose().map_err(|_| ConfigError::MissingKey("Group1.clusterCellSide".to_string()))?;

        if movement_model == MovementModelKind::RandomStationaryCluster {
            let (Some(clusters), Some(per_cluster)) = (nrof_clusters, hosts_per_cluster) else {
                return Err(ConfigError::MissingKey("Group1.nrofClusters/Group1.hostsPerCluster".to_string()));
            };
            if clusters * per_cluster != nrof_hosts as usize {
                return Err(ConfigError::ClusterHostCountMismatch {
                    nrof_clusters: clusters,
                    hosts_per_cluster: per_cluster,
                    nrof_hosts: nrof_hosts as usize,
                });
            }
        }

        let transmit_range_m = parse_num(&map, "bluetoothInterface.transmitRange")?;
        let max_parallel_connections = parse_num(&map, "bluetoothInterface.maximumParallelConnections")?;
        let churn_rate = map.get("bluetoothInterface.churnRate").map(|v| v.parse()).transpose().map_err(|_| ConfigError::MissingKey("bluetoothInterface.churnRate".to_string()))?.unwrap_or(0.0);
        let communication_mode = map.get("bluetoothInterface.communicationMode").map(|v| v.parse()).transpose().map_err(|_| ConfigError::MissingKey("bluetoothInterface.communicationMode".to_string()))?;

        let generator = match required(&map, "Events1.class")? {
            "ActiveHostMessageGenerator" => GeneratorKind::ActiveHost,
            "StaticHostMessageGenerator" => GeneratorKind::StaticHost,
            other => return Err(ConfigError::UnknownClass { kind: "generator", name: other.to_string() }),
        };
        let message_size_bytes = parse_num(&map, "Events1.size")?;
        let event_count_or_cap = parse_num(&map, "Events1.count")?;
        let bin_size_m = map.get("Events1.binSize").map(|v| v.parse()).transpose().map_err(|_| ConfigError::MissingKey("Events1.binSize".to_string()))?;

        let host_range = map
            .get("Events1.hosts")
            .map(|v| parse_pair::<u32>(v).ok_or_else(|| ConfigError::Parse { path: "<scenario>".to_string(), line: 0, message: "`Events1.hosts` must be `a,b`".to_string() }))
            .transpose()?;
        let to_host_range = map
            .get("Events1.toHosts")
            .map(|v| parse_pair::<u32>(v).ok_or_else(|| ConfigError::Parse { path: "<scenario>".to_string(), line: 0, message: "`Events1.toHosts` must be `a,b`".to_string() }))
            .transpose()?;
        if let (Some((a_start, a_end)), Some((b_start, b_end))) = (host_range, to_host_range)
            && a_start < b_end && b_start < a_end {
                return Err(ConfigError::OverlappingHostRanges { a_start, a_end, b_start, b_end });
            }

        let mut reports = Vec::new();
        let mut report_idx = 1;
        while let Some(v) = map.get(&format!("Report.report{report_idx}")) {
            reports.push(match v.as_str() {
                "UnifiedReport" => ReportKind::Unified,
                "AdjacencyMatrixReport" => ReportKind::Adjacency,
                other => return Err(ConfigError::UnknownClass { kind: "report", name: other.to_string() }),
            });
            report_idx += 1;
        }
        if reports.is_empty() {
            reports = vec![ReportKind::Unified, ReportKind::Adjacency];
        }

        let report_dir = map.get("Report.reportDir").cloned();

        Ok(Self {
            name,
            update_interval_s,
            end_time_s,
            rng_seed,
            world_width_m,
            world_height_m,
            nrof_hosts,
            router,
            movement_model,
            nrof_clusters,
            hosts_per_cluster,
            cluster_cell_side_m,
            transmit_range_m,
            max_parallel_connections,
            churn_rate,
            communication_mode,
            generator,
            message_size_bytes,
            event_count_or_cap,
            bin_size_m,
            host_range,
            to_host_range,
            reports,
            report_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
        Scenario.name = demo
        Scenario.updateInterval = 1
        Scenario.endTime = 60
        MovementModel.rngSeed = 1
        MovementModel.worldSize = 100,100
        Group1.nrofHosts = 2
        Group1.movementModel = RandomStationaryConstrained
        Group1.router = EpidemicRouter
        bluetoothInterface.transmitRange = 20
        bluetoothInterface.maximumParallelConnections = 8
        bluetoothInterface.churnRate = 0
        Events1.class = StaticHostMessageGenerator
        Events1.size = 100
        Events1.count = 1
    ";

    #[test]
    fn parses_minimal_scenario() {
        let cfg = ScenarioConfig::parse(MINIMAL).unwrap();
        assert_eq!(cfg.name, "demo");
        assert_eq!(cfg.router, RouterKind::Epidemic);
        assert_eq!(cfg.nrof_hosts, 2);
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let truncated = "Scenario.name = demo\n";
        assert!(ScenarioConfig::parse(truncated).is_err());
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let with_comments = format!("# a comment\n\n{MINIMAL}");
        assert!(ScenarioConfig::parse(&with_comments).is_ok());
    }

    #[test]
    fn cluster_mode_rejects_mismatched_counts() {
        let bad = MINIMAL.replace("Group1.movementModel = RandomStationaryConstrained", "Group1.movementModel = RandomStationaryCluster\nGroup1.nrofClusters = 3\nGroup1.hostsPerCluster = 5");
        let err = ScenarioConfig::parse(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ClusterHostCountMismatch { .. }));
    }

    #[test]
    fn parses_host_address_ranges() {
        let with_ranges = format!("{MINIMAL}\nEvents1.hosts = 0,1\nEvents1.toHosts = 1,2\n");
        let cfg = ScenarioConfig::parse(&with_ranges).unwrap();
        assert_eq!(cfg.host_range, Some((0, 1)));
        assert_eq!(cfg.to_host_range, Some((1, 2)));
    }

    #[test]
    fn overlapping_host_ranges_are_rejected() {
        let overlapping = format!("{MINIMAL}\nEvents1.hosts = 0,5\nEvents1.toHosts = 3,8\n");
        let err = ScenarioConfig::parse(&overlapping).unwrap_err();
        assert!(matches!(err, ConfigError::OverlappingHostRanges { .. }));
    }

    #[test]
    fn default_reports_are_both_enabled_when_unconfigured() {
        let cfg = ScenarioConfig::parse(MINIMAL).unwrap();
        assert_eq!(cfg.reports, vec![ReportKind::Unified, ReportKind::Adjacency]);
    }

    #[test]
    fn report_n_selects_a_single_reporter() {
        let with_report = format!("{MINIMAL}\nReport.report1 = UnifiedReport\n");
        let cfg = ScenarioConfig::parse(&with_report).unwrap();
        assert_eq!(cfg.reports, vec![ReportKind::Unified]);
    }

    #[test]
    fn unknown_report_class_is_a_config_error() {
        let bad = format!("{MINIMAL}\nReport.report1 = BogusReport\n");
        let err = ScenarioConfig::parse(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownClass { .. }));
    }
}
