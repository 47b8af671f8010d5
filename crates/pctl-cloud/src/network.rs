use std::sync::Arc;

use tracing::{error, info};

use crate::client::AwsClient;
use crate::error::CloudError;
use crate::xml::{xml_all_texts, xml_text};
use pctl_store::NetworkResources;

const VPC_CIDR: &str = "10.0.0.0/16";
const PUBLIC_SUBNET_CIDR: &str = "10.0.1.0/24";
const PRIVATE_SUBNET_CIDR: &str = "10.0.2.0/24";
const AVAILABILITY_ZONE_SUFFIX: &str = "a";
const MANAGED_BY_TAG_VALUE: &str = "pctl";

fn ec2_host(region: &str) -> String {
    format!("ec2.{region}.amazonaws.com")
}

/// Creates and tears down the per-cluster VPC when no externally supplied
/// subnet was given. Every resource it creates is tagged so ownership is
/// unambiguous even if local state is lost.
pub struct NetworkManager {
    client: Arc<AwsClient>,
}

impl NetworkManager {
    pub fn new(client: Arc<AwsClient>) -> Self {
        Self { client }
    }

    async fn ec2_call(&self, params: &[(&str, &str)]) -> Result<String, CloudError> {
        let host = ec2_host(&self.client.region);
        self.client.query_api(&host, "ec2", params).await
    }

    async fn tag(&self, resource_id: &str, cluster_name: &str, name_tag: &str) -> Result<(), CloudError> {
        self.ec2_call(&[
            ("Action", "CreateTags"),
            ("Version", "2016-11-15"),
            ("ResourceId.1", resource_id),
            ("Tag.1.Key", "Name"),
            ("Tag.1.Value", name_tag),
            ("Tag.2.Key", "ManagedBy"),
            ("Tag.2.Value", MANAGED_BY_TAG_VALUE),
            ("Tag.3.Key", "Cluster"),
            ("Tag.3.Value", cluster_name),
        ])
        .await?;
        Ok(())
    }

    /// Creates the full per-cluster network. On failure, returns whatever
    /// resources had already been created alongside the error so the caller
    /// (the Provisioner's CLEANUP_NET transition) can tear down exactly what
    /// exists instead of leaking orphans.
    pub async fn create_network(
        &self,
        cluster_name: &str,
    ) -> Result<NetworkResources, (NetworkResources, CloudError)> {
        let mut acc = NetworkResources::default();
        match self.create_network_steps(cluster_name, &mut acc).await {
            Ok(()) => Ok(acc),
            Err(err) => Err((acc, err)),
        }
    }

    async fn create_network_steps(
        &self,
        cluster_name: &str,
        acc: &mut NetworkResources,
    ) -> Result<(), CloudError> {
        let region = self.client.region.clone();
        let az = format!("{region}{AVAILABILITY_ZONE_SUFFIX}");

        let xml = self
            .ec2_call(&[("Action", "CreateVpc"), ("Version", "2016-11-15"), ("CidrBlock", VPC_CIDR)])
            .await?;
        let vpc_id = xml_text(&xml, "vpcId")
            .ok_or_else(|| CloudError::Internal("CreateVpc: no vpcId".into()))?;
        acc.vpc_id = Some(vpc_id.clone());
        self.tag(&vpc_id, cluster_name, &format!("{cluster_name}-vpc")).await?;

        let xml = self
            .ec2_call(&[
                ("Action", "CreateSubnet"),
                ("Version", "2016-11-15"),
                ("VpcId", &vpc_id),
                ("CidrBlock", PUBLIC_SUBNET_CIDR),
                ("AvailabilityZone", &az),
            ])
            .await?;
        let public_subnet_id = xml_text(&xml, "subnetId")
            .ok_or_else(|| CloudError::Internal("CreateSubnet(public): no subnetId".into()))?;
        acc.public_subnet_id = Some(public_subnet_id.clone());
        self.ec2_call(&[
            ("Action", "ModifySubnetAttribute"),
            ("Version", "2016-11-15"),
            ("SubnetId", &public_subnet_id),
            ("MapPublicIpOnLaunch.Value", "true"),
        ])
        .await?;
        self.tag(&public_subnet_id, cluster_name, &format!("{cluster_name}-public")).await?;

        let xml = self
            .ec2_call(&[
                ("Action", "CreateSubnet"),
                ("Version", "2016-11-15"),
                ("VpcId", &vpc_id),
                ("CidrBlock", PRIVATE_SUBNET_CIDR),
                ("AvailabilityZone", &az),
            ])
            .await?;
        let private_subnet_id = xml_text(&xml, "subnetId")
            .ok_or_else(|| CloudError::Internal("CreateSubnet(private): no subnetId".into()))?;
        acc.private_subnet_id = Some(private_subnet_id.clone());
        self.tag(&private_subnet_id, cluster_name, &format!("{cluster_name}-private")).await?;

        let xml = self
            .ec2_call(&[("Action", "CreateInternetGateway"), ("Version", "2016-11-15")])
            .await?;
        let igw_id = xml_text(&xml, "internetGatewayId")
            .ok_or_else(|| CloudError::Internal("CreateInternetGateway: no internetGatewayId".into()))?;
        acc.internet_gateway_id = Some(igw_id.clone());
        self.tag(&igw_id, cluster_name, &format!("{cluster_name}-igw")).await?;
        self.ec2_call(&[
            ("Action", "AttachInternetGateway"),
            ("Version", "2016-11-15"),
            ("InternetGatewayId", &igw_id),
            ("VpcId", &vpc_id),
        ])
        .await?;

        let xml = self
            .ec2_call(&[
                ("Action", "CreateRouteTable"),
                ("Version", "2016-11-15"),
                ("VpcId", &vpc_id),
            ])
            .await?;
        let route_table_id = xml_text(&xml, "routeTableId")
            .ok_or_else(|| CloudError::Internal("CreateRouteTable: no routeTableId".into()))?;
        acc.route_table_id = Some(route_table_id.clone());
        self.tag(&route_table_id, cluster_name, &format!("{cluster_name}-rt")).await?;
        self.ec2_call(&[
            ("Action", "CreateRoute"),
            ("Version", "2016-11-15"),
            ("RouteTableId", &route_table_id),
            ("DestinationCidrBlock", "0.0.0.0/0"),
            ("GatewayId", &igw_id),
        ])
        .await?;
        self.ec2_call(&[
            ("Action", "AssociateRouteTable"),
            ("Version", "2016-11-15"),
            ("RouteTableId", &route_table_id),
            ("SubnetId", &public_subnet_id),
        ])
        .await?;

        let xml = self
            .ec2_call(&[
                ("Action", "CreateSecurityGroup"),
                ("Version", "2016-11-15"),
                ("VpcId", &vpc_id),
                ("GroupName", &format!("{cluster_name}-sg")),
                ("GroupDescription", &format!("pctl cluster {cluster_name}")),
            ])
            .await?;
        let security_group_id = xml_text(&xml, "groupId")
            .ok_or_else(|| CloudError::Internal("CreateSecurityGroup: no groupId".into()))?;
        acc.security_group_id = Some(security_group_id.clone());
        self.tag(&security_group_id, cluster_name, &format!("{cluster_name}-sg")).await?;

        self.ec2_call(&[
            ("Action", "AuthorizeSecurityGroupIngress"),
            ("Version", "2016-11-15"),
            ("GroupId", &security_group_id),
            ("IpPermissions.1.IpProtocol", "tcp"),
            ("IpPermissions.1.FromPort", "22"),
            ("IpPermissions.1.ToPort", "22"),
            ("IpPermissions.1.IpRanges.1.CidrIp", "0.0.0.0/0"),
        ])
        .await?;
        self.ec2_call(&[
            ("Action", "AuthorizeSecurityGroupIngress"),
            ("Version", "2016-11-15"),
            ("GroupId", &security_group_id),
            ("IpPermissions.1.IpProtocol", "-1"),
            ("IpPermissions.1.Groups.1.GroupId", &security_group_id),
        ])
        .await?;

        info!(cluster_name, %vpc_id, "network resources created");
        Ok(())
    }

    /// Best-effort teardown in reverse dependency order. Individual
    /// deletion failures are logged but never abort the remaining steps.
    pub async fn delete_network(&self, resources: &NetworkResources) {
        for (kind, id) in resources.teardown_order() {
            let result = self.delete_one(kind, id).await;
            if let Err(err) = result {
                error!(kind, id, error = %err, "failed to delete network resource, continuing teardown");
            }
        }
    }

    async fn delete_one(&self, kind: &str, id: &str) -> Result<(), CloudError> {
        match kind {
            "security-group" => {
                self.ec2_call(&[("Action", "DeleteSecurityGroup"), ("Version", "2016-11-15"), ("GroupId", id)]).await?;
            }
            "route-table" => {
                self.ec2_call(&[("Action", "DeleteRouteTable"), ("Version", "2016-11-15"), ("RouteTableId", id)]).await?;
            }
            "internet-gateway" => {
                let vpc_xml = self
                    .ec2_call(&[
                        ("Action", "DescribeInternetGateways"),
                        ("Version", "2016-11-15"),
                        ("InternetGatewayId.1", id),
                    ])
                    .await?;
                if let Some(vpc_id) = xml_all_texts(&vpc_xml, "vpcId").into_iter().next() {
                    self.ec2_call(&[
                        ("Action", "DetachInternetGateway"),
                        ("Version", "2016-11-15"),
                        ("InternetGatewayId", id),
                        ("VpcId", &vpc_id),
                    ])
                    .await?;
                }
                self.ec2_call(&[("Action", "DeleteInternetGateway"), ("Version", "2016-11-15"), ("InternetGatewayId", id)]).await?;
            }
            "public-subnet" | "private-subnet" => {
                self.ec2_call(&[("Action", "DeleteSubnet"), ("Version", "2016-11-15"), ("SubnetId", id)]).await?;
            }
            "vpc" => {
                self.ec2_call(&[("Action", "DeleteVpc"), ("Version", "2016-11-15"), ("VpcId", id)]).await?;
            }
            other => return Err(CloudError::Internal(format!("unknown network resource kind {other}"))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ec2_host_is_region_scoped() {
        assert_eq!(ec2_host("eu-west-1"), "ec2.eu-west-1.amazonaws.com");
    }
}
