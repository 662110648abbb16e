// Copyright 2022 Zinc Labs Inc. and Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::infra::config::DEFAULT_PORT;

/// Parses `-p tcp <port> -p udp <port>`. An unspecified family falls back to
/// the default port.
pub fn args() -> Result<(u16, u16), anyhow::Error> {
    let app = clap::Command::new("shelterobserve")
        .about(clap::crate_description!())
        .override_usage("shelterobserve -p tcp <tcp_port> -p udp <udp_port>")
        .arg(
            clap::Arg::new("port")
                .short('p')
                .num_args(2)
                .value_names(["FAMILY", "PORT"])
                .action(clap::ArgAction::Append)
                .help("listener port per family, e.g. '-p tcp 5005 -p udp 5006'"),
        );
    let matches = app.get_matches();
    parse_ports(&matches)
}

fn parse_ports(matches: &clap::ArgMatches) -> Result<(u16, u16), anyhow::Error> {
    let mut tcp_port = DEFAULT_PORT;
    let mut udp_port = DEFAULT_PORT;
    if let Some(occurrences) = matches.get_occurrences::<String>("port") {
        for mut pair in occurrences {
            let family = pair
                .next()
                .ok_or_else(|| anyhow::anyhow!("-p requires a family and a port"))?;
            let port = pair
                .next()
                .ok_or_else(|| anyhow::anyhow!("{family} port must be specified"))?
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid {family} port: {e}"))?;
            match family.as_str() {
                "tcp" => tcp_port = port,
                "udp" => udp_port = port,
                other => {
                    anyhow::bail!("invalid -p option '{other}', it should be 'tcp' or 'udp'")
                }
            }
        }
    }
    Ok((tcp_port, udp_port))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_for(argv: &[&str]) -> clap::ArgMatches {
        clap::Command::new("shelterobserve")
            .arg(
                clap::Arg::new("port")
                    .short('p')
                    .num_args(2)
                    .action(clap::ArgAction::Append),
            )
            .get_matches_from(argv)
    }

    #[test]
    fn test_defaults_when_unspecified() {
        let matches = matches_for(&["shelterobserve"]);
        assert_eq!(parse_ports(&matches).unwrap(), (DEFAULT_PORT, DEFAULT_PORT));
    }

    #[test]
    fn test_both_families() {
        let matches = matches_for(&["shelterobserve", "-p", "tcp", "6000", "-p", "udp", "6001"]);
        assert_eq!(parse_ports(&matches).unwrap(), (6000, 6001));
    }

    #[test]
    fn test_single_family_keeps_default_for_the_other() {
        let matches = matches_for(&["shelterobserve", "-p", "udp", "7000"]);
        assert_eq!(parse_ports(&matches).unwrap(), (DEFAULT_PORT, 7000));
    }

    #[test]
    fn test_invalid_family_is_rejected() {
        let matches = matches_for(&["shelterobserve", "-p", "sctp", "7000"]);
        assert!(parse_ports(&matches).is_err());
    }
}
