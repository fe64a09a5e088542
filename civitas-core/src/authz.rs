//! Authorization descriptors shared between the authz engine and the
//! modules that own concrete authorization variants.

use std::collections::BTreeMap;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Api, Deps, Env};

use crate::error::CoreError;
use crate::msg::{AnyMsg, TypeUrl};

/// Outcome of [`Authorization::accept`].
#[cw_serde]
#[derive(Default)]
pub struct AcceptResponse {
    pub accept: bool,
    /// Remove the grant after this use.
    pub delete: bool,
    /// Replacement authorization to store in place of the current one.
    pub updated: Option<AnyMsg>,
}

impl AcceptResponse {
    pub fn accepted() -> Self {
        Self {
            accept: true,
            ..Self::default()
        }
    }

    pub fn rejected() -> Self {
        Self::default()
    }

    pub fn consumed() -> Self {
        Self {
            accept: true,
            delete: true,
            updated: None,
        }
    }

    pub fn updated(authorization: AnyMsg) -> Self {
        Self {
            accept: true,
            delete: false,
            updated: Some(authorization),
        }
    }
}

pub trait Authorization {
    /// Type URL of the message this authorization governs.
    fn msg_type_url(&self) -> String;

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError>;

    fn accept(&self, deps: Deps, env: &Env, msg: &AnyMsg) -> Result<AcceptResponse, CoreError>;
}

type Decoder = fn(&AnyMsg) -> Result<Box<dyn Authorization>, CoreError>;

fn decode_typed<A>(any: &AnyMsg) -> Result<Box<dyn Authorization>, CoreError>
where
    A: Authorization + TypeUrl + 'static,
{
    Ok(Box::new(A::from_any(any)?))
}

/// Closed `type_url -> decoder` registry of authorization variants.
#[derive(Default, Clone)]
pub struct AuthorizationRegistry {
    decoders: BTreeMap<String, Decoder>,
}

impl AuthorizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A>(&mut self) -> Result<(), CoreError>
    where
        A: Authorization + TypeUrl + 'static,
    {
        if self.decoders.contains_key(A::TYPE_URL) {
            return Err(CoreError::DuplicateRoute {
                type_url: A::TYPE_URL.to_string(),
            });
        }
        self.decoders
            .insert(A::TYPE_URL.to_string(), decode_typed::<A>);
        Ok(())
    }

    pub fn contains(&self, type_url: &str) -> bool {
        self.decoders.contains_key(type_url)
    }

    pub fn type_urls(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    pub fn decode(&self, any: &AnyMsg) -> Result<Box<dyn Authorization>, CoreError> {
        let decoder = self
            .decoders
            .get(&any.type_url)
            .ok_or_else(|| CoreError::UnknownAuthorization {
                type_url: any.type_url.clone(),
            })?;
        decoder(any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{mock_dependencies, mock_env};
    use cosmwasm_std::Binary;

    #[cw_serde]
    struct AllowAll {
        msg: String,
    }

    impl TypeUrl for AllowAll {
        const TYPE_URL: &'static str = "/test.AllowAll";
    }

    impl Authorization for AllowAll {
        fn msg_type_url(&self) -> String {
            self.msg.clone()
        }

        fn validate_basic(&self, _api: &dyn Api) -> Result<(), CoreError> {
            Ok(())
        }

        fn accept(
            &self,
            _deps: Deps,
            _env: &Env,
            _msg: &AnyMsg,
        ) -> Result<AcceptResponse, CoreError> {
            Ok(AcceptResponse::accepted())
        }
    }

    #[test]
    fn decodes_registered_variants() {
        let deps = mock_dependencies();
        let mut registry = AuthorizationRegistry::new();
        registry.register::<AllowAll>().unwrap();

        let any = AllowAll {
            msg: "/test.MsgX".to_string(),
        }
        .to_any()
        .unwrap();
        let auth = registry.decode(&any).unwrap();
        assert_eq!(auth.msg_type_url(), "/test.MsgX");
        let res = auth
            .accept(deps.as_ref(), &mock_env(), &AnyMsg::new("/test.MsgX", Binary::default()))
            .unwrap();
        assert_eq!(res, AcceptResponse::accepted());
    }

    #[test]
    fn unknown_and_duplicate_variants_fail() {
        let mut registry = AuthorizationRegistry::new();
        registry.register::<AllowAll>().unwrap();
        assert!(matches!(
            registry.register::<AllowAll>(),
            Err(CoreError::DuplicateRoute { .. })
        ));

        let err = registry
            .decode(&AnyMsg::new("/test.Other", Binary::default()))
            .err()
            .unwrap();
        assert_eq!(
            err,
            CoreError::UnknownAuthorization {
                type_url: "/test.Other".to_string()
            }
        );
    }
}
