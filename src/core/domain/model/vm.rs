//! Domain models for virtual machine operations.
//!
//! This module defines the structures returned by the Azure management layer
//! when listing or refreshing classic virtual machines.

use serde::{Deserialize, Serialize};

/// Power/provisioning state of a virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum VmStatus {
    #[default]
    Unknown,
    #[serde(alias = "Ready", alias = "ReadyRole")]
    Running,
    Stopped,
    StoppedDeallocated,
    Busy,
    Creating,
    Starting,
    Stopping,
    Deleting,
    Restarting,
    Cycling,
    FailedStarting,
    Unresponsive,
    Preparing,
}

impl VmStatus {
    /// Returns true if the machine is up and serving.
    pub fn is_running(self) -> bool {
        self == VmStatus::Running
    }

    /// Returns true if the machine is stopped, with or without deallocation.
    pub fn is_stopped(self) -> bool {
        matches!(self, VmStatus::Stopped | VmStatus::StoppedDeallocated)
    }
}

/// A public endpoint attached to a virtual machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Endpoint name (e.g., "RemoteDesktop").
    pub name: String,
    /// Transport protocol ("tcp" or "udp").
    pub protocol: String,
    /// Port inside the machine.
    pub private_port: u16,
    /// Port exposed on the cloud service.
    pub public_port: u16,
}

impl Endpoint {
    pub fn new(
        name: impl Into<String>,
        protocol: impl Into<String>,
        private_port: u16,
        public_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            protocol: protocol.into(),
            private_port,
            public_port,
        }
    }
}

/// A virtual machine as returned by the management API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    /// Role name of the machine.
    pub name: String,
    /// Cloud service hosting the deployment.
    pub service_name: String,
    /// Deployment the role belongs to.
    pub deployment_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    /// Instance size (e.g., "Small", "ExtraLarge").
    #[serde(default)]
    pub size: String,
    /// Last known status.
    #[serde(default)]
    pub status: VmStatus,
    /// Subscription the machine is billed to.
    pub subscription_id: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl VirtualMachine {
    /// Creates a machine description with no endpoints.
    pub fn new(
        name: impl Into<String>,
        service_name: impl Into<String>,
        subscription_id: impl Into<String>,
        status: VmStatus,
    ) -> Self {
        let name = name.into();
        let service_name = service_name.into();
        Self {
            deployment_name: service_name.clone(),
            name,
            service_name,
            availability_set: None,
            subnet: None,
            size: String::new(),
            status,
            subscription_id: subscription_id.into(),
            endpoints: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Returns true if any endpoint forwards to the given private port.
    pub fn has_private_port(&self, port: u16) -> bool {
        self.endpoints.iter().any(|e| e.private_port == port)
    }
}
