//! `guardiantrack-agentd` — host daemon for the GuardianTrack agent.
//!
//! Wires the core pipeline to this host's platform seams: a JSON-lines fix
//! feed on stdin, JSON-lines call/message log snapshots on disk, and an
//! exclusive lock file standing in for the platform's foreground-presence
//! subsystem. The daemon starts tracking on launch and stops on Ctrl-C /
//! SIGTERM.

pub mod platform;
