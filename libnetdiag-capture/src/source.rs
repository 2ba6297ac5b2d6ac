use libnetdiag_tools::{Config, Duration, Error};
use pcap::{Active, Capture, Device};
use pcap_parser::Linktype;
use tracing::debug;

/// One raw unit of data delivered by a capture provider, link-layer bytes
/// included.
pub struct RawFrame {
    pub data: Vec<u8>,
    pub caplen: u32,
    pub origlen: u32,
    pub ts: Duration,
}

/// Source of raw link-layer frames.
///
/// `next_frame` returns `Ok(None)` when no frame was available before the
/// poll timeout; an `Err` is a transient read failure the caller may retry.
/// The underlying handle is closed on drop.
pub trait FrameSource: Send {
    fn link_type(&self) -> Linktype;
    fn set_filter(&mut self, expr: &str) -> Result<(), Error>;
    fn next_frame(&mut self) -> Result<Option<RawFrame>, Error>;
}

/// Factory opening a `FrameSource` on a named interface.
pub trait FrameSourceProvider: Send + Sync {
    fn open(&self, interface: &str, config: &Config) -> Result<Box<dyn FrameSource>, Error>;
}

/// Live frame source backed by the host packet-capture facility.
pub struct PcapFrameSource {
    cap: Capture<Active>,
    link_type: Linktype,
}

impl PcapFrameSource {
    pub fn open(interface_name: &str, config: &Config) -> Result<Self, Error> {
        let interfaces = Device::list().map_err(|e| Error::InterfaceList(e.to_string()))?;
        let dev = interfaces
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| Error::InterfaceOpen(format!("no such interface: {interface_name}")))?;

        let immediate = config.get_bool("capture.immediate").unwrap_or(true);
        let promisc = config.get_bool("capture.promisc").unwrap_or(true);
        let snaplen = config.get_usize("capture.snaplen").unwrap_or(65535) as i32;

        let cap = Capture::from_device(dev)
            .map_err(|e| Error::InterfaceOpen(e.to_string()))?
            .immediate_mode(immediate)
            .promisc(promisc)
            .snaplen(snaplen);
        let cap = cap
            .open()
            .and_then(|cap| cap.setnonblock())
            .map_err(|e| Error::InterfaceOpen(e.to_string()))?;

        // convert from the `pcap` crate format to the `pcap-parser` format
        let link_type = Linktype(cap.get_datalink().0);
        debug!("opened {interface_name}, link type {link_type:?}");

        Ok(PcapFrameSource { cap, link_type })
    }
}

impl FrameSource for PcapFrameSource {
    fn link_type(&self) -> Linktype {
        self.link_type
    }

    fn set_filter(&mut self, expr: &str) -> Result<(), Error> {
        self.cap
            .filter(expr, true)
            .map_err(|e| Error::Filter(e.to_string()))
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame>, Error> {
        match self.cap.next_packet() {
            Ok(packet) => {
                let header = packet.header;
                let ts = Duration::new(header.ts.tv_sec as u32, header.ts.tv_usec as u32);
                Ok(Some(RawFrame {
                    data: packet.data.to_vec(),
                    caplen: header.caplen,
                    origlen: header.len,
                    ts,
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(Error::FrameRead(e.to_string())),
        }
    }
}

/// Default provider, opening live pcap handles.
pub struct PcapSourceProvider;

impl FrameSourceProvider for PcapSourceProvider {
    fn open(&self, interface: &str, config: &Config) -> Result<Box<dyn FrameSource>, Error> {
        PcapFrameSource::open(interface, config).map(|s| Box::new(s) as Box<dyn FrameSource>)
    }
}
