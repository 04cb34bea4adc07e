//! Simple actuator controller stand-in for bench testing the line protocol.
//!
//! Accepts one client at a time, prints every command it receives and can be told to report a
//! stall after a number of commands.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

use comms_if::eqpt::{ActCmd, ActStatus};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "test_act_server", about = "Fake actuator controller")]
struct Opts {
    /// Port to listen on
    #[structopt(short, long, default_value = "59898")]
    port: u16,

    /// Report `stalled inner` after every N collect commands
    #[structopt(long)]
    stall_inner_every: Option<usize>,

    /// Report `stalled outer` after every N collect commands
    #[structopt(long)]
    stall_outer_every: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::from_args();

    let listener = TcpListener::bind(("0.0.0.0", opts.port))?;

    println!("Actuator server running on port {}", opts.port);

    for stream in listener.incoming() {
        match stream {
            Ok(s) => {
                if let Err(e) = serve(s, &opts) {
                    println!("Client error: {}", e);
                }
            },
            Err(e) => println!("Accept failed: {}", e)
        }
    }

    Ok(())
}

fn serve(stream: TcpStream, opts: &Opts) -> std::io::Result<()> {
    println!("Client connected from {}", stream.peer_addr()?);

    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    let mut num_collects = 0usize;

    for line in reader.lines() {
        let line = line?;

        match line.parse::<ActCmd>() {
            Ok(cmd) => {
                println!("Recieved {:?}", cmd);

                // Only count active collection, stop commands never stall
                if let ActCmd::Collect { inner_speed, outer_speed } = cmd {
                    if inner_speed != 0 || outer_speed != 0 {
                        num_collects += 1;

                        if let Some(status) = stall_due(num_collects, opts) {
                            println!("Reporting \"{}\"", status.as_line());
                            writeln!(writer, "{}", status.as_line())?;
                        }
                    }
                }
            },
            Err(e) => println!("Bad line \"{}\": {}", line, e)
        }
    }

    println!("Client disconnected");

    Ok(())
}

fn stall_due(num_collects: usize, opts: &Opts) -> Option<ActStatus> {
    let due = |every: Option<usize>| match every {
        Some(n) if n > 0 => num_collects % n == 0,
        _ => false
    };

    if due(opts.stall_inner_every) {
        Some(ActStatus::StalledInner)
    }
    else if due(opts.stall_outer_every) {
        Some(ActStatus::StalledOuter)
    }
    else {
        None
    }
}
