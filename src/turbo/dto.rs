//! Response shapes returned by the platform's `/api/v3` endpoints. Only the
//! fields the reporter reads are modelled; everything else is ignored.

use serde::Deserialize;
use std::collections::HashMap;

pub const EPOCH_HISTORICAL: &str = "HISTORICAL";
pub const STATE_ACTIVE: &str = "ACTIVE";
pub const CLASS_CONTAINER_CLUSTER: &str = "ContainerPlatformCluster";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDto {
    pub uuid: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub providers: Vec<ProviderDto>,
    /// Tag values are normally lists, but scalars do show up.
    #[serde(default)]
    pub tags: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDto {
    pub uuid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    pub uuid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub member_uuid_list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSnapshotDto {
    #[serde(default)]
    pub epoch: Option<String>,
    #[serde(default)]
    pub statistics: Vec<StatApiDto>,
}

impl StatSnapshotDto {
    pub fn is_historical(&self) -> bool {
        self.epoch.as_deref() == Some(EPOCH_HISTORICAL)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatApiDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: Option<StatValuesDto>,
    #[serde(default)]
    pub capacity: Option<StatCapacityDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatValuesDto {
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatCapacityDto {
    #[serde(default)]
    pub total: Option<f64>,
}

/// Per-entity stats returned by the scoped `POST /stats` query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStatsDto {
    pub uuid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub stats: Vec<StatSnapshotDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyChainDto {
    #[serde(default)]
    pub se_map: HashMap<String, SupplyChainEntryDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplyChainEntryDto {
    #[serde(default)]
    pub instances: HashMap<String, ServiceEntityDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntityDto {
    pub uuid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub aspects: Option<AspectsDto>,
}

impl ServiceEntityDto {
    pub fn is_active(&self) -> bool {
        self.state.as_deref() == Some(STATE_ACTIVE)
    }

    pub fn num_vcpus(&self) -> Option<u32> {
        self.aspects
            .as_ref()
            .and_then(|a| a.virtual_machine_aspect.as_ref())
            .and_then(|vm| vm.num_vcpus)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectsDto {
    #[serde(default)]
    pub virtual_machine_aspect: Option<VirtualMachineAspectDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VirtualMachineAspectDto {
    #[serde(default, rename = "numVCPUs")]
    pub num_vcpus: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_namespace_entity() {
        let raw = serde_json::json!({
            "uuid": "ns-1",
            "displayName": "payments",
            "className": "Namespace",
            "providers": [
                {"uuid": "c-1", "displayName": "prod", "className": "ContainerPlatformCluster"}
            ],
            "tags": {"owner": ["team-a"], "tier": "gold"}
        });
        let entity: EntityDto = serde_json::from_value(raw).unwrap();
        assert_eq!(entity.display_name, "payments");
        assert_eq!(entity.providers[0].class_name.as_deref(), Some(CLASS_CONTAINER_CLUSTER));
        assert!(entity.tags["owner"].is_array());
        assert!(entity.tags["tier"].is_string());
    }

    #[test]
    fn test_decode_supply_chain() {
        let raw = serde_json::json!([{
            "seMap": {
                "VirtualMachine": {
                    "instances": {
                        "vm-1": {
                            "uuid": "vm-1",
                            "state": "ACTIVE",
                            "aspects": {"virtualMachineAspect": {"numVCPUs": 8}}
                        }
                    }
                }
            }
        }]);
        let chains: Vec<SupplyChainDto> = serde_json::from_value(raw).unwrap();
        let vm = &chains[0].se_map["VirtualMachine"].instances["vm-1"];
        assert!(vm.is_active());
        assert_eq!(vm.num_vcpus(), Some(8));
    }

    #[test]
    fn test_decode_snapshot_with_partial_statistic() {
        let raw = serde_json::json!({
            "date": "2024-02-01T00:00:00Z",
            "epoch": "HISTORICAL",
            "statistics": [{"name": "VCPU", "values": {"avg": 10.5}}]
        });
        let snapshot: StatSnapshotDto = serde_json::from_value(raw).unwrap();
        assert!(snapshot.is_historical());
        let stat = &snapshot.statistics[0];
        assert_eq!(stat.values.as_ref().and_then(|v| v.max), None);
        assert!(stat.capacity.is_none());
    }
}
