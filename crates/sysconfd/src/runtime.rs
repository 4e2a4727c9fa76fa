use crate::config::Config;
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use sysconf_bus::{BusConsumer, LocalBus};
use sysconf_protocol::{AGENTBUS_KEY, CHOWN_AUTOPROV_CONFIG_KEY, IPBX_KEY};
use sysconf_requests::{
    AgentBusCommandFactory, AgentBusExecutor, AsteriskCommandExecutor, AsteriskCommandFactory,
    ChownAutoprovExecutor, CommandCategory, DuplicateRequestOptimizer, ProcessRunner,
    ReloadEventHandler, RequestFactory, RequestHandlers, RequestProcessor, RequestQueue,
    SimpleCommandFactory, ASTERISK_EXECUTOR,
};
use tokio::task::JoinHandle;

/// The running pipeline: bus, single request consumer and bus dispatch.
pub struct Runtime {
    bus: LocalBus,
    handlers: Arc<RequestHandlers>,
    processor: JoinHandle<()>,
    dispatch: JoinHandle<()>,
}

impl Runtime {
    /// Wires every component and spawns the background tasks. `config.uuid`
    /// must already be resolved.
    pub fn start(config: &Config, runner: Arc<dyn ProcessRunner>) -> Result<Self> {
        let node_uuid = config.uuid.clone().context("node uuid is not resolved")?;
        let bus = LocalBus::new(node_uuid.clone(), config.bus.capacity);
        let publisher = Arc::new(bus.clone());

        let asterisk = Arc::new(AsteriskCommandExecutor::new(
            publisher.clone(),
            runner,
            config.asterisk.clone(),
        ));
        let agentbus = Arc::new(AgentBusExecutor::new(publisher.clone()));
        let chown = Arc::new(ChownAutoprovExecutor::new(config.chown_autoprov.clone()));

        let factory = RequestFactory::new(vec![
            CommandCategory::new(IPBX_KEY, Arc::new(AsteriskCommandFactory::new(asterisk))),
            CommandCategory::new(
                AGENTBUS_KEY,
                Arc::new(
                    AgentBusCommandFactory::new(agentbus)
                        .context("failed to build agentbus command factory")?,
                ),
            ),
            CommandCategory::new(
                CHOWN_AUTOPROV_CONFIG_KEY,
                Arc::new(SimpleCommandFactory::new(chown)),
            ),
        ]);

        let queue = Arc::new(RequestQueue::new(Arc::new(DuplicateRequestOptimizer::new(
            ASTERISK_EXECUTOR,
        ))));
        let processor = RequestProcessor::new(queue.clone()).spawn();

        let mode = config.request_handlers.mode();
        let handlers = Arc::new(RequestHandlers::new(factory, queue, publisher).with_mode(mode));

        let consumer = BusConsumer::new();
        let reload_events = ReloadEventHandler::new(node_uuid.clone(), handlers.clone());
        Arc::new(reload_events).subscribe(&consumer);
        let dispatch = consumer.start(&bus);

        info!("Request pipeline started on node {node_uuid} ({mode:?})");
        Ok(Self {
            bus,
            handlers,
            processor,
            dispatch,
        })
    }

    pub fn handlers(&self) -> &RequestHandlers {
        &self.handlers
    }

    /// Entry point for events relayed from peer nodes.
    #[cfg(test)]
    pub fn bus(&self) -> &LocalBus {
        &self.bus
    }

    /// Stops the background tasks; queued requests are dropped.
    pub fn shutdown(self) {
        self.dispatch.abort();
        self.processor.abort();
        info!("Request pipeline of node {} stopped", self.bus.origin_uuid());
    }
}
