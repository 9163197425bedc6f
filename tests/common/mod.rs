#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const PLAN_JSON: &str = r#"{
  "format_version": "1.2",
  "terraform_version": "1.9.5",
  "planned_values": {
    "root_module": {
      "resources": [
        {
          "address": "azurerm_resource_group.dev",
          "mode": "managed",
          "type": "azurerm_resource_group",
          "name": "dev",
          "provider_name": "registry.terraform.io/hashicorp/azurerm",
          "values": { "location": "westeurope", "name": "rg-vnet-dev" }
        }
      ],
      "child_modules": [
        {
          "address": "module.vnet",
          "resources": [
            {
              "address": "module.vnet.azurerm_virtual_network.this",
              "mode": "managed",
              "type": "azurerm_virtual_network",
              "name": "this",
              "provider_name": "registry.terraform.io/hashicorp/azurerm",
              "values": { "address_space": ["10.10.0.0/16"], "name": "vnet-dev" }
            }
          ]
        }
      ]
    }
  },
  "resource_changes": [
    {
      "address": "azurerm_resource_group.dev",
      "mode": "managed",
      "type": "azurerm_resource_group",
      "name": "dev",
      "change": { "actions": ["create"], "before": null, "after": {} }
    },
    {
      "address": "module.vnet.azurerm_virtual_network.this",
      "module_address": "module.vnet",
      "mode": "managed",
      "type": "azurerm_virtual_network",
      "name": "this",
      "change": { "actions": ["create"], "before": null, "after": {} }
    }
  ]
}"#;

/// A stand-in `terraform` that logs its arguments and answers init/plan/show/version.
///
/// `init_stderr` makes `init` fail with that text and exit code 1.
pub fn fake_terraform(dir: &Path, init_stderr: Option<&str>) -> PathBuf {
    let fixture = dir.join("plan.json");
    std::fs::write(&fixture, PLAN_JSON).expect("write plan fixture");
    let log = dir.join("calls.log");

    let init = match init_stderr {
        Some(stderr) => format!("printf '%s\\n' '{stderr}' >&2; exit 1"),
        None => "echo 'Terraform has been successfully initialized!'".to_string(),
    };

    let script = format!(
        r#"#!/bin/sh
echo "$@" >> '{log}'
case "$1" in
  init)
    {init}
    ;;
  plan)
    for arg in "$@"; do
      case "$arg" in
        -out=*) printf 'planfile' > "${{arg#-out=}}" ;;
      esac
    done
    ;;
  show)
    for last in "$@"; do :; done
    if [ ! -f "$last" ]; then
      echo "Error: Failed to read the given file as a state or plan file" >&2
      exit 1
    fi
    cat '{fixture}'
    ;;
  version)
    echo '{{"terraform_version":"1.9.5","platform":"linux_amd64"}}'
    ;;
  *)
    echo "unexpected command: $1" >&2
    exit 2
    ;;
esac
"#,
        log = log.display(),
        fixture = fixture.display(),
    );

    let path = dir.join("terraform");
    std::fs::write(&path, script).expect("write fake terraform");
    make_executable(&path);
    path
}

pub fn calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn env_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).expect("create env dir");
    std::fs::write(
        dir.join("main.tf"),
        "module \"vnet\" {\n  source = \"../modules/vnet\"\n}\n",
    )
    .expect("write main.tf");
    dir
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path).expect("stat").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("chmod");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
