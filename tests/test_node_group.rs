mod common;

use std::sync::Arc;
use cluster_autoscaler_core::cloud_service::{CloudService, InstanceId};
use cluster_autoscaler_core::default_node_groups::cloud_node_group::CloudNodeGroup;
use cluster_autoscaler_core::error::{CloudProviderError, ConfigError};
use cluster_autoscaler_core::node_group::{NodeGroup, NodeGroupSpec};
use common::{cloud, cloud_group};

#[test]
fn test_parse_node_group_spec() {
    let spec = "1:10:k8s-worker-asg-1".parse::<NodeGroupSpec>().unwrap();
    assert_eq!(spec, NodeGroupSpec::new("k8s-worker-asg-1", 1, 10));
    assert_eq!(spec.to_string(), "1:10:k8s-worker-asg-1");

    for invalid in ["", "1:10", "a:10:ng", "1:b:ng", "10:1:ng", "1:10:", "-1:10:ng"] {
        assert!(matches!(invalid.parse::<NodeGroupSpec>(), Err(ConfigError::InvalidNodeGroupSpec(_))),
                "{:?} should not parse", invalid);
    }
}

#[test]
fn test_increase_size_rejects_non_positive_delta() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "1:5:ng1", 2);
    assert!(matches!(node_group.increase_size(0), Err(CloudProviderError::InvalidArgument(_))));
    assert!(matches!(node_group.increase_size(-1), Err(CloudProviderError::InvalidArgument(_))));
    assert_eq!(cloud_service.calls("ng1").resize, 0);
}

#[test]
fn test_increase_size_respects_max_size() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "1:5:ng1", 2);
    assert!(matches!(node_group.increase_size(4), Err(CloudProviderError::LimitExceeded(_))));
    assert_eq!(cloud_service.calls("ng1").resize, 0);

    node_group.increase_size(3).unwrap();
    assert_eq!(cloud_service.calls("ng1").resize, 1);
    assert_eq!(node_group.target_size().unwrap(), 5);
}

#[test]
fn test_increase_size_by_huge_delta() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "1:5:ng1", 2);
    assert!(matches!(node_group.increase_size(i64::MAX), Err(CloudProviderError::LimitExceeded(_))));
    assert_eq!(cloud_service.calls("ng1").resize, 0);
    assert_eq!(node_group.target_size().unwrap(), 2);
}

#[test]
fn test_decrease_target_size_by_huge_delta() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "0:5:ng1", 0);
    assert!(node_group.decrease_target_size(i64::MIN).is_err());
    assert_eq!(cloud_service.calls("ng1").resize, 0);
}

#[test]
fn test_decrease_target_size() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "0:10:ng1", 2);
    node_group.increase_size(3).unwrap();

    assert!(matches!(node_group.decrease_target_size(0), Err(CloudProviderError::InvalidArgument(_))));
    assert!(matches!(node_group.decrease_target_size(1), Err(CloudProviderError::InvalidArgument(_))));
    assert!(matches!(node_group.decrease_target_size(-4), Err(CloudProviderError::PreconditionFailed(_))));
    assert_eq!(node_group.target_size().unwrap(), 5);

    node_group.decrease_target_size(-3).unwrap();
    assert_eq!(node_group.target_size().unwrap(), 2);
}

#[test]
fn test_decrease_target_size_respects_min_size() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "4:10:ng1", 2);
    cloud_service.resize("ng1", 5).unwrap();
    assert!(matches!(node_group.decrease_target_size(-2), Err(CloudProviderError::LimitExceeded(_))));
    node_group.decrease_target_size(-1).unwrap();
    assert_eq!(node_group.target_size().unwrap(), 4);
}

#[test]
fn test_delete_nodes() {
    let (cloud_service, resolver) = cloud();
    let (node_group, instances) = cloud_group(&cloud_service, &resolver, "1:5:ng1", 3);
    node_group.delete_nodes(&instances[..2]).unwrap();
    assert_eq!(node_group.target_size().unwrap(), 1);
    assert_eq!(node_group.nodes().unwrap(), vec![instances[2].clone()]);
    assert_eq!(cloud_service.calls("ng1").delete_instance, 2);
}

#[test]
fn test_delete_nodes_respects_min_size() {
    let (cloud_service, resolver) = cloud();
    let (node_group, instances) = cloud_group(&cloud_service, &resolver, "2:5:ng1", 3);
    assert!(matches!(node_group.delete_nodes(&instances[..2]), Err(CloudProviderError::PreconditionFailed(_))));
    assert_eq!(cloud_service.calls("ng1").delete_instance, 0);
    node_group.delete_nodes(&instances[..1]).unwrap();
    assert_eq!(node_group.target_size().unwrap(), 2);
}

#[test]
fn test_delete_nodes_down_to_exactly_min_size() {
    let (cloud_service, resolver) = cloud();
    let (node_group, instances) = cloud_group(&cloud_service, &resolver, "1:5:ng1", 3);
    node_group.delete_nodes(&instances[1..]).unwrap();
    assert_eq!(node_group.target_size().unwrap(), 1);
    assert!(matches!(node_group.delete_nodes(&instances[..1]), Err(CloudProviderError::PreconditionFailed(_))));
    assert_eq!(node_group.nodes().unwrap(), vec![instances[0].clone()]);
}

#[test]
fn test_delete_nodes_of_other_group() {
    let (cloud_service, resolver) = cloud();
    let (node_group, own) = cloud_group(&cloud_service, &resolver, "0:5:ng1", 2);
    let (_, foreign) = cloud_group(&cloud_service, &resolver, "0:5:ng2", 2);

    let result = node_group.delete_nodes(&[own[0].clone(), foreign[0].clone()]);
    assert!(matches!(result, Err(CloudProviderError::PreconditionFailed(_))));
    let result = node_group.delete_nodes(&[InstanceId::new("unknown")]);
    assert!(matches!(result, Err(CloudProviderError::PreconditionFailed(_))));
    assert_eq!(cloud_service.calls("ng1").delete_instance, 0);
    assert_eq!(node_group.nodes().unwrap().len(), 2);
}

#[test]
fn test_delete_nodes_continues_after_failure() {
    let (cloud_service, resolver) = cloud();
    let (node_group, instances) = cloud_group(&cloud_service, &resolver, "0:5:ng1", 3);
    cloud_service.set_fail_deletion(&instances[0]);

    let result = node_group.delete_nodes(&instances);
    assert!(matches!(result, Err(CloudProviderError::Provider(_))));
    assert_eq!(cloud_service.calls("ng1").delete_instance, 3);
    assert_eq!(node_group.nodes().unwrap(), vec![instances[0].clone()]);
}

#[test]
fn test_delete_no_nodes() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "1:5:ng1", 1);
    node_group.delete_nodes(&[]).unwrap();
}

#[test]
fn test_existing_group_cannot_be_created_or_deleted() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "0:5:ng1", 0);
    assert!(node_group.exist());
    assert!(!node_group.autoprovisioned());
    assert!(matches!(node_group.create(), Err(CloudProviderError::NotImplemented(_))));
    assert!(matches!(node_group.delete(), Err(CloudProviderError::NotImplemented(_))));
}

#[test]
fn test_autoprovisioned_group_lifecycle() {
    let (cloud_service, resolver) = cloud();
    let node_group = CloudNodeGroup::new_autoprovisioned(NodeGroupSpec::new("auto", 0, 3), "zone-b",
                                                         cloud_service.clone(), resolver.clone());
    assert!(!node_group.exist());
    assert!(node_group.autoprovisioned());
    assert_eq!(node_group.zone(), "zone-b");
    assert_eq!(node_group.target_size().unwrap(), 0);
    assert!(node_group.nodes().unwrap().is_empty());

    node_group.create().unwrap();
    assert!(node_group.exist());
    assert!(cloud_service.has_group("auto"));
    assert!(matches!(node_group.create(), Err(CloudProviderError::PreconditionFailed(_))));

    node_group.increase_size(2).unwrap();
    assert!(matches!(node_group.delete(), Err(CloudProviderError::PreconditionFailed(_))));

    let instances = cloud_service.provision();
    resolver.register("auto");
    node_group.delete_nodes(&instances).unwrap();
    node_group.delete().unwrap();
    assert!(!node_group.exist());
    assert!(!cloud_service.has_group("auto"));
}

#[test]
fn test_node_group_as_trait_object() {
    let (cloud_service, resolver) = cloud();
    let (node_group, _) = cloud_group(&cloud_service, &resolver, "1:5:ng1", 1);
    let node_group: Arc<dyn NodeGroup> = Arc::new(node_group);
    assert_eq!(node_group.id(), "ng1");
    assert_eq!(node_group.min_size(), 1);
    assert_eq!(node_group.max_size(), 5);
    assert!(format!("{:?}", node_group).contains("ng1"));
}
