//! Single-process echo demo over the in-memory transport.
//!
//! Run:
//! - cargo run -p peerlink --example echo

use std::time::Duration;

use peerlink::{BindConfig, Bridge, Event, HostOptions, MemoryTransport, PacketFlags, SendData};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = Bridge::<MemoryTransport>::new();
    server.initialize()?;
    server.create_host(Some(BindConfig::port(9000)), HostOptions::default())?;
    println!("echo server listening on 0.0.0.0:9000");

    let mut client = Bridge::<MemoryTransport>::new();
    client.initialize()?;
    client.create_host(None, HostOptions::default())?;
    let server_peer = client.connect("127.0.0.1", 9000, 2, 0)?;
    println!("client connecting, handle {server_peer}");

    // Wait for the client side to see its connection complete.
    loop {
        match client.service(Duration::from_millis(100))? {
            Some(Event::Connect { peer }) => {
                println!("[client] connected, handle {peer}");
                break;
            }
            Some(event) => println!("[client] unexpected {event:?}"),
            None => {}
        }
    }

    let sent = client.send(server_peer, 0, SendData::Text("hello"), PacketFlags::RELIABLE)?;
    println!("[client] queued {sent} bytes");

    // The server answers everything it receives on the same channel.
    let mut answered = false;
    while !answered {
        match server.service(Duration::from_millis(100))? {
            Some(Event::Connect { peer }) => println!("[server] connect, handle {peer}"),
            Some(Event::Receive { peer, channel, payload }) => {
                let text = String::from_utf8_lossy(&payload);
                println!("[server] channel={channel} payload=\"{text}\"");
                server.send(peer, channel, SendData::Bytes(&payload), PacketFlags::RELIABLE)?;
                answered = true;
            }
            Some(Event::Disconnect { peer, data }) => {
                println!("[server] disconnect, handle {peer} data={data}");
            }
            None => {}
        }
    }

    loop {
        if let Some(Event::Receive { payload, .. }) = client.service(Duration::from_millis(100))? {
            println!("[client] echo: \"{}\"", String::from_utf8_lossy(&payload));
            break;
        }
    }

    client.disconnect(server_peer, 0)?;
    client.deinitialize();
    server.deinitialize();
    Ok(())
}
