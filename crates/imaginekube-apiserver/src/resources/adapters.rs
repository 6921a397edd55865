//! 各资源类型特有的过滤与排序
//!
//! 未处理的字段回落到元数据过滤。

use super::{default_object_meta_compare, default_object_meta_filter};
use imaginekube_common::models::query::{
    FIELD_LAST_UPDATE_TIMESTAMP, FIELD_NODE_NAME, FIELD_STATUS, FIELD_TYPE,
};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Namespace, Node, PersistentVolumeClaim, Pod, Secret};
use k8s_openapi::chrono::{DateTime, Utc};
use std::cmp::Ordering;

pub const STATUS_STOPPED: &str = "stopped";
pub const STATUS_RUNNING: &str = "running";
pub const STATUS_UPDATING: &str = "updating";

const STATUS_COMPLETED: &str = "completed";
const STATUS_FAILED: &str = "failed";
const STATUS_UNSCHEDULABLE: &str = "unschedulable";
const STATUS_WARNING: &str = "warning";

const FIELD_PVC_NAME: &str = "pvcName";
const FIELD_ROLE: &str = "role";
const FIELD_STORAGE_CLASS: &str = "storageClassName";
const NODE_ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";

fn replica_status(desired: Option<i32>, ready: i32) -> &'static str {
    match desired {
        None => STATUS_STOPPED,
        Some(0) if ready == 0 => STATUS_STOPPED,
        Some(desired) if desired == ready => STATUS_RUNNING,
        Some(_) => STATUS_UPDATING,
    }
}

/// 部署状态：stopped、running 或 updating
pub fn deployment_status(deployment: &Deployment) -> &'static str {
    let desired = deployment.spec.as_ref().and_then(|spec| spec.replicas);
    let ready = deployment
        .status
        .as_ref()
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0);
    replica_status(desired, ready)
}

/// 有状态副本集状态，判定规则与部署相同
pub fn statefulset_status(statefulset: &StatefulSet) -> &'static str {
    let desired = statefulset.spec.as_ref().and_then(|spec| spec.replicas);
    let ready = statefulset
        .status
        .as_ref()
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0);
    replica_status(desired, ready)
}

/// 守护进程集状态，以期望调度数作为副本数
pub fn daemonset_status(daemonset: &DaemonSet) -> &'static str {
    match &daemonset.status {
        Some(status) => replica_status(
            Some(status.desired_number_scheduled),
            status.number_ready,
        ),
        None => STATUS_STOPPED,
    }
}

/// 任务状态：running、failed 或 completed
pub fn job_status(job: &Job) -> &'static str {
    let status = match &job.status {
        Some(status) => status,
        None => return STATUS_RUNNING,
    };
    if status.active.unwrap_or(0) > 0 {
        STATUS_RUNNING
    } else if status.failed.unwrap_or(0) > 0 {
        STATUS_FAILED
    } else if status.succeeded.unwrap_or(0) > 0 {
        STATUS_COMPLETED
    } else {
        STATUS_RUNNING
    }
}

fn node_status(node: &Node) -> &'static str {
    if node.spec.as_ref().and_then(|spec| spec.unschedulable) == Some(true) {
        return STATUS_UNSCHEDULABLE;
    }
    let ready = node
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .into_iter()
        .flatten()
        .any(|condition| condition.type_ == "Ready" && condition.status == "True");
    if ready {
        STATUS_RUNNING
    } else {
        STATUS_WARNING
    }
}

fn deployment_last_update(deployment: &Deployment) -> Option<DateTime<Utc>> {
    deployment
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|condition| condition.last_update_time.as_ref().map(|t| t.0))
        .max()
}

fn job_last_update(job: &Job) -> Option<DateTime<Utc>> {
    let status = job.status.as_ref()?;
    status
        .conditions
        .iter()
        .flatten()
        .filter_map(|condition| condition.last_transition_time.as_ref().map(|t| t.0))
        .chain(status.completion_time.as_ref().map(|t| t.0))
        .chain(status.start_time.as_ref().map(|t| t.0))
        .max()
}

pub fn filter_deployment(deployment: &Deployment, field: &str, value: &str) -> bool {
    match field {
        FIELD_STATUS => deployment_status(deployment) == value,
        _ => default_object_meta_filter(&deployment.metadata, field, value),
    }
}

pub fn compare_deployment(left: &Deployment, right: &Deployment, sort_by: &str) -> Ordering {
    match sort_by {
        FIELD_LAST_UPDATE_TIMESTAMP => deployment_last_update(left)
            .cmp(&deployment_last_update(right))
            .then_with(|| default_object_meta_compare(&left.metadata, &right.metadata, sort_by)),
        _ => default_object_meta_compare(&left.metadata, &right.metadata, sort_by),
    }
}

pub fn filter_statefulset(statefulset: &StatefulSet, field: &str, value: &str) -> bool {
    match field {
        FIELD_STATUS => statefulset_status(statefulset) == value,
        _ => default_object_meta_filter(&statefulset.metadata, field, value),
    }
}

pub fn filter_daemonset(daemonset: &DaemonSet, field: &str, value: &str) -> bool {
    match field {
        FIELD_STATUS => daemonset_status(daemonset) == value,
        _ => default_object_meta_filter(&daemonset.metadata, field, value),
    }
}

pub fn filter_job(job: &Job, field: &str, value: &str) -> bool {
    match field {
        FIELD_STATUS => job_status(job) == value,
        _ => default_object_meta_filter(&job.metadata, field, value),
    }
}

pub fn compare_job(left: &Job, right: &Job, sort_by: &str) -> Ordering {
    match sort_by {
        FIELD_LAST_UPDATE_TIMESTAMP => job_last_update(left)
            .cmp(&job_last_update(right))
            .then_with(|| default_object_meta_compare(&left.metadata, &right.metadata, sort_by)),
        _ => default_object_meta_compare(&left.metadata, &right.metadata, sort_by),
    }
}

pub fn filter_pod(pod: &Pod, field: &str, value: &str) -> bool {
    match field {
        FIELD_NODE_NAME => {
            pod.spec.as_ref().and_then(|spec| spec.node_name.as_deref()) == Some(value)
        }
        FIELD_STATUS => {
            pod.status.as_ref().and_then(|status| status.phase.as_deref()) == Some(value)
        }
        FIELD_PVC_NAME => pod
            .spec
            .as_ref()
            .and_then(|spec| spec.volumes.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|volume| volume.persistent_volume_claim.as_ref())
            .any(|claim| claim.claim_name == value),
        _ => default_object_meta_filter(&pod.metadata, field, value),
    }
}

pub fn filter_namespace(namespace: &Namespace, field: &str, value: &str) -> bool {
    match field {
        FIELD_STATUS => {
            namespace.status.as_ref().and_then(|status| status.phase.as_deref()) == Some(value)
        }
        _ => default_object_meta_filter(&namespace.metadata, field, value),
    }
}

pub fn filter_secret(secret: &Secret, field: &str, value: &str) -> bool {
    match field {
        FIELD_TYPE => secret.type_.as_deref() == Some(value),
        _ => default_object_meta_filter(&secret.metadata, field, value),
    }
}

pub fn filter_pvc(pvc: &PersistentVolumeClaim, field: &str, value: &str) -> bool {
    match field {
        FIELD_STATUS => pvc
            .status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            .map_or(false, |phase| phase.eq_ignore_ascii_case(value)),
        FIELD_STORAGE_CLASS => {
            pvc.spec.as_ref().and_then(|spec| spec.storage_class_name.as_deref()) == Some(value)
        }
        _ => default_object_meta_filter(&pvc.metadata, field, value),
    }
}

pub fn filter_node(node: &Node, field: &str, value: &str) -> bool {
    match field {
        FIELD_STATUS => node_status(node) == value,
        FIELD_ROLE => node
            .metadata
            .labels
            .as_ref()
            .map_or(false, |labels| {
                labels.contains_key(&format!("{}{}", NODE_ROLE_LABEL_PREFIX, value))
            }),
        _ => default_object_meta_filter(&node.metadata, field, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{
        DaemonSetStatus, DeploymentSpec, DeploymentStatus, StatefulSetSpec, StatefulSetStatus,
    };
    use k8s_openapi::api::batch::v1::JobStatus;
    use k8s_openapi::api::core::v1::{
        NodeCondition, NodeSpec, NodeStatus, PersistentVolumeClaimStatus, PersistentVolumeClaimVolumeSource,
        PodSpec, PodStatus, Volume,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn deployment(replicas: Option<i32>, ready: Option<i32>) -> Deployment {
        Deployment {
            spec: Some(DeploymentSpec {
                replicas,
                ..DeploymentSpec::default()
            }),
            status: Some(DeploymentStatus {
                ready_replicas: ready,
                ..DeploymentStatus::default()
            }),
            ..Deployment::default()
        }
    }

    #[rstest]
    #[case(None, Some(0), STATUS_STOPPED)]
    #[case(Some(0), None, STATUS_STOPPED)]
    #[case(Some(3), Some(3), STATUS_RUNNING)]
    #[case(Some(3), Some(1), STATUS_UPDATING)]
    #[case(Some(0), Some(1), STATUS_UPDATING)]
    fn test_deployment_status(
        #[case] replicas: Option<i32>,
        #[case] ready: Option<i32>,
        #[case] expected: &str,
    ) {
        let deployment = deployment(replicas, ready);
        assert_eq!(deployment_status(&deployment), expected);
        assert!(filter_deployment(&deployment, "status", expected));
    }

    #[test]
    fn test_statefulset_status() {
        let statefulset = StatefulSet {
            spec: Some(StatefulSetSpec {
                replicas: Some(2),
                ..StatefulSetSpec::default()
            }),
            status: Some(StatefulSetStatus {
                ready_replicas: Some(2),
                ..StatefulSetStatus::default()
            }),
            ..StatefulSet::default()
        };
        assert_eq!(statefulset_status(&statefulset), STATUS_RUNNING);
        assert!(!filter_statefulset(&statefulset, "status", STATUS_UPDATING));
    }

    #[test]
    fn test_daemonset_status() {
        let daemonset = DaemonSet {
            status: Some(DaemonSetStatus {
                desired_number_scheduled: 3,
                number_ready: 2,
                ..DaemonSetStatus::default()
            }),
            ..DaemonSet::default()
        };
        assert_eq!(daemonset_status(&daemonset), STATUS_UPDATING);
        assert_eq!(daemonset_status(&DaemonSet::default()), STATUS_STOPPED);
    }

    #[test]
    fn test_job_status() {
        let job = |active, failed, succeeded| Job {
            status: Some(JobStatus {
                active: Some(active),
                failed: Some(failed),
                succeeded: Some(succeeded),
                ..JobStatus::default()
            }),
            ..Job::default()
        };
        assert_eq!(job_status(&job(1, 0, 0)), STATUS_RUNNING);
        assert_eq!(job_status(&job(0, 1, 0)), STATUS_FAILED);
        assert_eq!(job_status(&job(0, 0, 1)), STATUS_COMPLETED);
        assert!(filter_job(&job(0, 0, 1), "status", "completed"));
    }

    #[test]
    fn test_filter_pod() {
        let pod = Pod {
            spec: Some(PodSpec {
                node_name: Some("node-1".to_string()),
                volumes: Some(vec![Volume {
                    name: "data".to_string(),
                    persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                        claim_name: "data-pvc".to_string(),
                        ..PersistentVolumeClaimVolumeSource::default()
                    }),
                    ..Volume::default()
                }]),
                ..PodSpec::default()
            }),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                ..PodStatus::default()
            }),
            ..Pod::default()
        };
        assert!(filter_pod(&pod, "nodeName", "node-1"));
        assert!(!filter_pod(&pod, "nodeName", "node-2"));
        assert!(filter_pod(&pod, "status", "Running"));
        assert!(filter_pod(&pod, "pvcName", "data-pvc"));
    }

    #[test]
    fn test_filter_secret_and_pvc() {
        let secret = Secret {
            type_: Some("kubernetes.io/dockerconfigjson".to_string()),
            ..Secret::default()
        };
        assert!(filter_secret(&secret, "type", "kubernetes.io/dockerconfigjson"));
        assert!(!filter_secret(&secret, "type", "Opaque"));

        let pvc = PersistentVolumeClaim {
            status: Some(PersistentVolumeClaimStatus {
                phase: Some("Bound".to_string()),
                ..PersistentVolumeClaimStatus::default()
            }),
            ..PersistentVolumeClaim::default()
        };
        assert!(filter_pvc(&pvc, "status", "bound"));
    }

    #[test]
    fn test_filter_node() {
        let node = Node {
            metadata: ObjectMeta {
                labels: Some(BTreeMap::from([(
                    "node-role.kubernetes.io/master".to_string(),
                    String::new(),
                )])),
                ..ObjectMeta::default()
            },
            spec: Some(NodeSpec::default()),
            status: Some(NodeStatus {
                conditions: Some(vec![NodeCondition {
                    type_: "Ready".to_string(),
                    status: "True".to_string(),
                    ..NodeCondition::default()
                }]),
                ..NodeStatus::default()
            }),
        };
        assert!(filter_node(&node, "role", "master"));
        assert!(!filter_node(&node, "role", "worker"));
        assert!(filter_node(&node, "status", STATUS_RUNNING));
    }
}
