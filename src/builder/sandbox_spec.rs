use super::annotations::{passthrough_annotations, stamp_reserved};
use super::cgroups::sandbox_cgroups_path;
use super::mounts::sandbox_mounts;
use super::namespaces::NamespacePlan;
use super::process::{sandbox_process, selinux_labels};
use super::resources::{linux_resources, resource_annotations};
use super::sysctls::effective_sysctls;
use crate::config::OperatorSettings;
use crate::cri::{ImageProcessDefaults, SandboxRequest};
use crate::host::HostSecurity;
use crate::oci::{Linux, OCI_VERSION, Root, Spec};
use anyhow::{Context, Result};
use log::{debug, trace};

/// Builds the OCI runtime spec for the sandbox container `id`.
///
/// The network namespace at `netns_path` must already exist when the
/// network is pod-private; it is ignored when the pod shares the host
/// network. The only failures come from `host`, in which case nothing is
/// returned.
pub fn build_sandbox_spec(
    id: &str,
    request: &SandboxRequest,
    image: &ImageProcessDefaults,
    settings: &OperatorSettings,
    netns_path: &str,
    host: &dyn HostSecurity,
) -> Result<Spec> {
    debug!(
        "Building sandbox spec for {} ({}/{})",
        id, request.metadata.namespace, request.metadata.name
    );

    let plan = NamespacePlan::from_options(request.namespace_options());
    trace!("Namespace plan: {:?}", plan);

    let labels = selinux_labels(host, request)
        .context(format!("Failed to label sandbox {}", id))?;

    let resources = request.linux.resources.as_ref();
    let sysctl = effective_sysctls(
        settings,
        &request.linux.sysctls,
        plan.network_is_host(),
        host.in_user_namespace(),
    );

    let linux = Linux {
        namespaces: plan.namespaces(netns_path),
        cgroups_path: sandbox_cgroups_path(
            settings,
            &request.linux.cgroup_parent,
            id,
        ),
        sysctl,
        resources: linux_resources(settings, resources),
        mount_label: labels.mount.clone(),
    };
    trace!("cgroupsPath for {}: {:?}", id, linux.cgroups_path);

    let patterns = settings.pod_annotations.as_deref();
    let mut annotations = passthrough_annotations(&request.annotations, patterns);
    for (key, value) in resource_annotations(resources) {
        annotations.insert(key.to_string(), value);
    }
    stamp_reserved(&mut annotations, id, request);

    let spec = Spec {
        oci_version: OCI_VERSION.to_string(),
        root: Root::sandbox(),
        process: sandbox_process(request, image, settings, &labels),
        hostname: request.hostname.clone(),
        mounts: sandbox_mounts(settings, id, plan.ipc_is_host()),
        linux,
        annotations,
    };
    debug!(
        "Sandbox spec for {} has {} namespaces and {} annotations",
        id,
        spec.linux.namespaces.len(),
        spec.annotations.len()
    );
    Ok(spec)
}
