use std::collections::BTreeMap;

use cosmwasm_std::{Addr, Api, DepsMut, Env, Event, Response};

use crate::error::CoreError;
use crate::msg::{validate_addr, AnyMsg};

/// A state-machine module reachable through the [`Router`].
///
/// Handlers receive the router itself so they can dispatch nested messages
/// (proposal execution, authorized execution) without owning their peers.
pub trait Module {
    fn name(&self) -> &'static str;

    /// Type URLs this module handles. Registered once, at router build time.
    fn msg_type_urls(&self) -> Vec<&'static str>;

    fn signers(&self, msg: &AnyMsg) -> Result<Vec<String>, CoreError>;

    fn validate_basic(&self, api: &dyn Api, msg: &AnyMsg) -> Result<(), CoreError>;

    fn execute(
        &self,
        deps: DepsMut,
        env: &Env,
        router: &Router,
        msg: &AnyMsg,
    ) -> Result<Response, CoreError>;

    fn begin_block(
        &self,
        _deps: DepsMut,
        _env: &Env,
        _router: &Router,
    ) -> Result<Vec<Event>, CoreError> {
        Ok(vec![])
    }

    fn end_block(
        &self,
        _deps: DepsMut,
        _env: &Env,
        _router: &Router,
    ) -> Result<Vec<Event>, CoreError> {
        Ok(vec![])
    }
}

/// Flattens a handler response into events: its attributes become one
/// `message` event tagged with `module`, followed by the response's own events.
pub fn response_events(module: &str, res: Response) -> Vec<Event> {
    let mut events = Vec::with_capacity(res.events.len() + 1);
    if !res.attributes.is_empty() {
        events.push(
            Event::new("message")
                .add_attribute("module", module)
                .add_attributes(res.attributes),
        );
    }
    events.extend(res.events);
    events
}

/// Closed registry from message type URL to the module handling it.
#[derive(Default)]
pub struct Router {
    modules: Vec<Box<dyn Module>>,
    routes: BTreeMap<String, usize>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: Box<dyn Module>) -> Result<(), CoreError> {
        let index = self.modules.len();
        for type_url in module.msg_type_urls() {
            if self.routes.contains_key(type_url) {
                return Err(CoreError::DuplicateRoute {
                    type_url: type_url.to_string(),
                });
            }
        }
        for type_url in module.msg_type_urls() {
            self.routes.insert(type_url.to_string(), index);
        }
        self.modules.push(module);
        Ok(())
    }

    /// Builder form of [`Router::register`].
    pub fn with(mut self, module: Box<dyn Module>) -> Result<Self, CoreError> {
        self.register(module)?;
        Ok(self)
    }

    pub fn handler(&self, type_url: &str) -> Option<&dyn Module> {
        self.routes
            .get(type_url)
            .and_then(|index| self.modules.get(*index))
            .map(|module| module.as_ref())
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    fn route(&self, msg: &AnyMsg) -> Result<&dyn Module, CoreError> {
        self.handler(&msg.type_url)
            .ok_or_else(|| CoreError::UnregisteredMsg {
                type_url: msg.type_url.clone(),
            })
    }

    /// Signer addresses declared by `msg`, validated through the address codec.
    pub fn signers(&self, api: &dyn Api, msg: &AnyMsg) -> Result<Vec<Addr>, CoreError> {
        self.route(msg)?
            .signers(msg)?
            .iter()
            .map(|signer| validate_addr(api, signer))
            .collect()
    }

    pub fn validate_basic(&self, api: &dyn Api, msg: &AnyMsg) -> Result<(), CoreError> {
        self.route(msg)?.validate_basic(api, msg)
    }

    pub fn dispatch(&self, deps: DepsMut, env: &Env, msg: &AnyMsg) -> Result<Response, CoreError> {
        self.route(msg)?.execute(deps, env, self, msg)
    }

    /// Begin-block hooks, in registration order.
    pub fn begin_block(&self, mut deps: DepsMut, env: &Env) -> Result<Vec<Event>, CoreError> {
        let mut events = vec![];
        for module in &self.modules {
            events.extend(module.begin_block(deps.branch(), env, self)?);
        }
        Ok(events)
    }

    /// End-block hooks, in registration order.
    pub fn end_block(&self, mut deps: DepsMut, env: &Env) -> Result<Vec<Event>, CoreError> {
        let mut events = vec![];
        for module in &self.modules {
            events.extend(module.end_block(deps.branch(), env, self)?);
        }
        Ok(events)
    }
}
