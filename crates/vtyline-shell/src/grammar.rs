//! The demo router grammar and its command handlers.
//!
//! A small simulated device: a host name, a table of interfaces, and the
//! show/config commands to inspect and mutate them. Handlers print their
//! output directly; the engine only sees opaque callbacks.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::rc::Rc;

use vtyline_engine::{CommandHandler, CommandMode, Grammar};
use vtyline_types::{LeafType, Result, TokenValue, VtyError};

// Handler codes, handed back opaquely at submission.
const SHOW_VERSION: u32 = 1;
const SHOW_INTERFACES: u32 = 2;
const SHOW_ROUTES: u32 = 3;
const CLEAR_COUNTERS: u32 = 4;
const RUN_SCRIPT: u32 = 5;
const SET_HOSTNAME: u32 = 10;
const SET_INTERFACE: u32 = 11;
const SET_ADDRESS: u32 = 12;
const SET_SHUTDOWN: u32 = 13;
const SET_DESCRIPTION: u32 = 14;

/// One simulated interface.
#[derive(Debug, Clone, Default)]
pub struct Interface {
    pub address: Option<Ipv4Addr>,
    pub shutdown: bool,
    pub description: Option<String>,
    pub rx_packets: u64,
    pub tx_packets: u64,
}

/// Mutable device state shared by every handler.
#[derive(Debug, Default)]
pub struct DeviceState {
    pub hostname: RefCell<String>,
    pub interfaces: RefCell<BTreeMap<String, Interface>>,
    /// Path of a script requested via `run`, drained by the REPL.
    pub pending_script: RefCell<Option<String>>,
}

impl DeviceState {
    pub fn new(hostname: &str) -> Rc<Self> {
        Rc::new(Self {
            hostname: RefCell::new(hostname.to_string()),
            ..Self::default()
        })
    }
}

// ---------------------------------------------------------------------------
// show / clear / run
// ---------------------------------------------------------------------------

struct OperHandlers {
    state: Rc<DeviceState>,
}

impl CommandHandler for OperHandlers {
    fn execute(&self, code: u32, args: &[TokenValue], _mode: CommandMode) -> Result<()> {
        match code {
            SHOW_VERSION => {
                println!("vtyline {} (demo device)", env!("CARGO_PKG_VERSION"));
                println!("host name: {}", self.state.hostname.borrow());
                Ok(())
            },
            SHOW_INTERFACES => {
                let ifaces = self.state.interfaces.borrow();
                if ifaces.is_empty() {
                    println!("no interfaces configured");
                    return Ok(());
                }
                println!("{:<12} {:<16} {:<6} {:>8} {:>8}", "name", "address", "state", "rx", "tx");
                for (name, i) in ifaces.iter() {
                    let addr = i
                        .address
                        .map_or_else(|| "unassigned".to_string(), |a| a.to_string());
                    let state = if i.shutdown { "down" } else { "up" };
                    println!(
                        "{name:<12} {addr:<16} {state:<6} {:>8} {:>8}",
                        i.rx_packets, i.tx_packets
                    );
                }
                Ok(())
            },
            SHOW_ROUTES => {
                let ifaces = self.state.interfaces.borrow();
                for (name, i) in ifaces.iter() {
                    if let Some(addr) = i.address
                        && !i.shutdown
                    {
                        println!("C  {addr}/32 is directly connected, {name}");
                    }
                }
                Ok(())
            },
            CLEAR_COUNTERS => {
                for i in self.state.interfaces.borrow_mut().values_mut() {
                    i.rx_packets = 0;
                    i.tx_packets = 0;
                }
                println!("counters cleared");
                Ok(())
            },
            RUN_SCRIPT => {
                let Some(path) = args.last() else {
                    return Err(VtyError::Submit("run: missing script path".into()));
                };
                *self.state.pending_script.borrow_mut() = Some(path.text().to_string());
                Ok(())
            },
            other => Err(VtyError::Submit(format!("unknown handler code {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

struct ConfigHandlers {
    state: Rc<DeviceState>,
}

impl ConfigHandlers {
    /// The interface a scoped config slice refers to: the value token
    /// accepted for the interface-name slot.
    fn interface_arg(args: &[TokenValue]) -> Option<&str> {
        args.iter()
            .find(|t| t.leaf_id() == LEAF_IFACE_NAME)
            .map(TokenValue::text)
    }
}

impl CommandHandler for ConfigHandlers {
    fn execute(&self, code: u32, args: &[TokenValue], mode: CommandMode) -> Result<()> {
        let disable = mode == CommandMode::ConfigDisable;
        match code {
            SET_HOSTNAME => {
                let Some(name) = args.last() else {
                    return Err(VtyError::Submit("host-name: missing value".into()));
                };
                let mut hostname = self.state.hostname.borrow_mut();
                if disable {
                    *hostname = "vty".to_string();
                } else {
                    *hostname = name.text().to_string();
                }
                Ok(())
            },
            SET_INTERFACE => {
                let Some(name) = Self::interface_arg(args) else {
                    return Err(VtyError::Submit("interface: missing name".into()));
                };
                let mut ifaces = self.state.interfaces.borrow_mut();
                if disable {
                    ifaces.remove(name);
                } else {
                    ifaces.entry(name.to_string()).or_default();
                }
                Ok(())
            },
            SET_ADDRESS | SET_SHUTDOWN | SET_DESCRIPTION => {
                let Some(name) = Self::interface_arg(args) else {
                    return Err(VtyError::Submit("interface scope missing".into()));
                };
                let mut ifaces = self.state.interfaces.borrow_mut();
                let Some(iface) = ifaces.get_mut(name) else {
                    return Err(VtyError::Submit(format!("no such interface '{name}'")));
                };
                match code {
                    SET_ADDRESS => {
                        if disable {
                            iface.address = None;
                        } else {
                            let Some(text) = args.last() else {
                                return Err(VtyError::Submit("address: missing value".into()));
                            };
                            let addr = text.text().parse::<Ipv4Addr>().map_err(|e| {
                                VtyError::Submit(format!("address: {e}"))
                            })?;
                            iface.address = Some(addr);
                        }
                    },
                    SET_SHUTDOWN => iface.shutdown = !disable,
                    _ => {
                        if disable {
                            iface.description = None;
                        } else if let Some(text) = args.last() {
                            iface.description = Some(text.text().to_string());
                        }
                    },
                }
                Ok(())
            },
            other => Err(VtyError::Submit(format!("unknown handler code {other}"))),
        }
    }
}

// Leaf slot ids.
const LEAF_HOSTNAME: u32 = 1;
pub const LEAF_IFACE_NAME: u32 = 2;
const LEAF_ADDRESS: u32 = 3;
const LEAF_DESCRIPTION: u32 = 4;
const LEAF_SCRIPT_PATH: u32 = 5;

/// Register the demo command surface into a fresh grammar.
pub fn register_demo_grammar(g: &mut Grammar, state: &Rc<DeviceState>) -> Result<()> {
    let oper: Rc<dyn CommandHandler> = Rc::new(OperHandlers {
        state: Rc::clone(state),
    });
    let conf: Rc<dyn CommandHandler> = Rc::new(ConfigHandlers {
        state: Rc::clone(state),
    });

    // -- show --
    let version = g.make_command("version", "Software version and host name");
    g.register(g.hooks().show, version)?;
    g.set_handler(version, Rc::clone(&oper), SHOW_VERSION)?;
    g.allow_filter(version)?;

    let interfaces = g.make_command("interfaces", "Interface table");
    g.register(g.hooks().show, interfaces)?;
    g.set_handler(interfaces, Rc::clone(&oper), SHOW_INTERFACES)?;
    g.allow_filter(interfaces)?;

    let ip = g.make_command("ip", "IP state");
    let route = g.make_command("route", "Routing table");
    g.register(g.hooks().show, ip)?;
    g.register(ip, route)?;
    g.set_handler(route, Rc::clone(&oper), SHOW_ROUTES)?;
    g.allow_filter(route)?;

    // -- clear --
    let counters = g.make_command("counters", "Zero the interface counters");
    g.register(g.hooks().clear, counters)?;
    g.set_handler(counters, Rc::clone(&oper), CLEAR_COUNTERS)?;

    // -- run --
    let script = g.make_leaf(LeafType::String, LEAF_SCRIPT_PATH, "Script file path");
    g.register(g.hooks().run, script)?;
    g.set_handler(script, Rc::clone(&oper), RUN_SCRIPT)?;

    // -- config --
    let host = g.make_command("host-name", "System host name");
    let host_val = g.make_leaf(LeafType::String, LEAF_HOSTNAME, "New host name");
    g.register(g.hooks().config, host)?;
    g.register(host, host_val)?;
    g.set_handler(host_val, Rc::clone(&conf), SET_HOSTNAME)?;
    g.set_validator(
        host_val,
        Rc::new(|_: &[TokenValue], text: &str| {
            text.chars().next().is_some_and(char::is_alphabetic)
        }),
    )?;

    let iface = g.make_command("interface", "Select an interface");
    let iface_name = g.make_leaf(LeafType::String, LEAF_IFACE_NAME, "Interface name");
    g.register(g.hooks().config, iface)?;
    g.register(iface, iface_name)?;
    g.set_handler(iface_name, Rc::clone(&conf), SET_INTERFACE)?;
    g.mark_mode(iface_name)?;
    {
        let state = Rc::clone(state);
        g.set_display(
            iface_name,
            Rc::new(move |_: &[TokenValue]| {
                state.interfaces.borrow().keys().cloned().collect()
            }),
        )?;
    }

    // Interface-mode commands hang off the name slot.
    let ip_kw = g.make_command("ip", "IP settings");
    let address = g.make_command("address", "Set the interface address");
    let addr_val = g.make_leaf(LeafType::Ipv4, LEAF_ADDRESS, "IPv4 address");
    g.register(iface_name, ip_kw)?;
    g.register(ip_kw, address)?;
    g.register(address, addr_val)?;
    g.set_handler(addr_val, Rc::clone(&conf), SET_ADDRESS)?;

    let shutdown = g.make_command("shutdown", "Disable the interface");
    g.register(iface_name, shutdown)?;
    g.set_handler(shutdown, Rc::clone(&conf), SET_SHUTDOWN)?;

    let descr = g.make_command("description", "Interface description");
    let descr_val = g.make_leaf(LeafType::String, LEAF_DESCRIPTION, "Description text");
    g.register(iface_name, descr)?;
    g.register(descr, descr_val)?;
    g.set_handler(descr_val, Rc::clone(&conf), SET_DESCRIPTION)?;

    // `no` under the config branch and inside interface scope.
    g.install_negation(g.hooks().config)?;
    g.install_negation(iface_name)?;

    log::info!("demo grammar registered ({} nodes)", g.node_count());
    Ok(())
}
