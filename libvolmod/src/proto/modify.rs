// `modify.v1alpha1`: the out-of-tree volume modification service implemented
// by drivers that predate `ControllerModifyVolume`.

/// Intentionally empty.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetCsiDriverModificationCapabilityRequest {}
/// Intentionally empty.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetCsiDriverModificationCapabilityResponse {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModifyVolumePropertiesRequest {
    /// Name of the volume, as known to the driver.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// Properties to change.
    #[prost(map = "string, string", tag = "2")]
    pub parameters: ::std::collections::HashMap<
        ::prost::alloc::string::String,
        ::prost::alloc::string::String,
    >,
    /// Opaque request context, e.g. credentials.
    #[prost(map = "string, string", tag = "3")]
    pub context: ::std::collections::HashMap<
        ::prost::alloc::string::String,
        ::prost::alloc::string::String,
    >,
}
/// Intentionally empty.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ModifyVolumePropertiesResponse {}
/// Generated client implementations.
pub mod modify_client {
    #![allow(
        unused_variables,
        dead_code,
        missing_docs,
        clippy::wildcard_imports,
        clippy::let_unit_value,
    )]
    use tonic::codegen::*;
    #[derive(Debug, Clone)]
    pub struct ModifyClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl<T> ModifyClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::Body>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub async fn get_csi_driver_modification_capability(
            &mut self,
            request: impl tonic::IntoRequest<
                super::GetCsiDriverModificationCapabilityRequest,
            >,
        ) -> std::result::Result<
            tonic::Response<super::GetCsiDriverModificationCapabilityResponse>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/modify.v1alpha1.Modify/GetCSIDriverModificationCapability",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(
                    GrpcMethod::new(
                        "modify.v1alpha1.Modify",
                        "GetCSIDriverModificationCapability",
                    ),
                );
            self.inner.unary(req, path, codec).await
        }
        pub async fn modify_volume_properties(
            &mut self,
            request: impl tonic::IntoRequest<super::ModifyVolumePropertiesRequest>,
        ) -> std::result::Result<
            tonic::Response<super::ModifyVolumePropertiesResponse>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/modify.v1alpha1.Modify/ModifyVolumeProperties",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(
                    GrpcMethod::new("modify.v1alpha1.Modify", "ModifyVolumeProperties"),
                );
            self.inner.unary(req, path, codec).await
        }
    }
}
