// Copyright 2024 the ota-receiver authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host transport adapter: bridges UDP datagrams into the update receiver.

use ota_receiver::env::host::HostEnv;
use ota_receiver::{UpdateReceiver, UPDATE_PORT};
use std::net::UdpSocket;

fn main() -> std::io::Result<()> {
    let state_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("ota-state"));
    let env = HostEnv::new(&state_dir)?;
    let mut receiver = UpdateReceiver::new(env);

    let socket = UdpSocket::bind(("0.0.0.0", UPDATE_PORT))?;
    println!("listening on port {}, state in {}", UPDATE_PORT, state_dir);

    // One datagram is fully processed before the next is received, so the
    // controller never sees concurrent messages.
    let mut buf = [0u8; 4096];
    loop {
        let (len, sender) = socket.recv_from(&mut buf)?;
        let reply = receiver.process_datagram(&buf[..len]);
        socket.send_to(reply.as_bytes(), sender)?;
    }
}
