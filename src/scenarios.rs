// Built-in scenarios used by the CLI, the coverage report and the tests

use crate::error::ActionError;
use crate::scenario::Scenario;
use crate::schema::*;

// Three single-host subnets in a row, one exploit and one privilege escalation
// Internet -> [1] -> [2] -> [3]
pub fn tiny() -> Result<Scenario, ActionError> {
    tiny_builder("tiny").build()
}

fn tiny_builder(name: &str) -> crate::scenario::ScenarioBuilder {
    Scenario::builder(name)
        .subnets(&[1, 1, 1])
        .os(&["linux"])
        .services(&["ssh"])
        .processes(&["tomcat"])
        .exploit("e_ssh", ExploitDef::new("ssh", Some("linux"), 1.0, 0.8, AccessLevel::User))
        .privesc("pe_tomcat", PrivescDef::new("tomcat", Some("linux"), 1.0, 1.0, AccessLevel::Root))
        .scan_costs(ScanCosts {
            service_scan: 1.0,
            os_scan: 1.0,
            subnet_scan: 1.0,
            process_scan: 1.0,
        })
}

// Same network as `tiny`, with a defender guarding the two inner subnets
pub fn tiny_with_defender() -> Result<Scenario, ActionError> {
    let countermeasure = |cost: f64| DefenderActionDef {
        cost,
        prob: 1.0,
        req_access: AccessLevel::None,
    };

    tiny_builder("tiny-with-defender")
        .defender_costs(DefenderCosts {
            change_os: countermeasure(3.0),
            change_firewall: countermeasure(2.0),
            stop_service: countermeasure(1.0),
            stop_process: countermeasure(1.0),
        })
        .defendable(&[Address::new(2, 0), Address::new(3, 0)])
        .build()
}

// Generate a scenario with `number_of_subnets` subnets of `hosts_per_subnet` hosts each
// Two operating systems, three services and two processes; every exploit and
// privilege escalation has a distinct (service|process, os) key
pub fn uniform(number_of_subnets: usize, hosts_per_subnet: usize) -> Result<Scenario, ActionError> {
    let subnet_sizes = vec![hosts_per_subnet; number_of_subnets];

    Scenario::builder(&format!("uniform-{}x{}", number_of_subnets, hosts_per_subnet))
        .subnets(&subnet_sizes)
        .os(&["linux", "windows"])
        .services(&["ssh", "ftp", "http"])
        .processes(&["tomcat", "daclsvc"])
        .exploit("e_ssh", ExploitDef::new("ssh", Some("linux"), 3.0, 0.9, AccessLevel::User))
        .exploit("e_ftp", ExploitDef::new("ftp", Some("windows"), 1.0, 0.6, AccessLevel::Root))
        .exploit("e_http", ExploitDef::new("http", None, 2.0, 0.8, AccessLevel::User))
        .privesc("pe_tomcat", PrivescDef::new("tomcat", Some("linux"), 1.0, 1.0, AccessLevel::Root))
        .privesc("pe_daclsvc", PrivescDef::new("daclsvc", Some("windows"), 1.0, 1.0, AccessLevel::Root))
        .scan_costs(ScanCosts {
            service_scan: 1.0,
            os_scan: 2.0,
            subnet_scan: 1.0,
            process_scan: 1.0,
        })
        .build()
}
