//! Fabricated scanner payloads for demo mode
//!
//! Each payload substitutes the input target and carries a `[MOCK]`
//! marker. Payloads for tools that normally emit JSON stay valid JSON
//! (the marker lives inside a string field) so downstream parsing and
//! findings derivation behave exactly as with real output.

/// Fabricated output for one scanner against a target
pub fn payload(scanner: &str, target: &str) -> String {
    match scanner {
        "nmap" => format!(
            "[MOCK] Nmap scan for {target}\nHost is up (0.001s latency).\nPORT STATE SERVICE\n80/tcp open http\n443/tcp open https"
        ),
        "nikto" => format!(
            r#"{{
  "host": "{target}",
  "ip": "127.0.0.1",
  "vulnerabilities": [
    "[MOCK] No CGI Directories found (use '-C all' to force check all possible dirs)",
    "Allowed HTTP Methods: GET, HEAD, POST, OPTIONS",
    "OSVDB-3092: /admin/: This might be interesting..."
  ]
}}"#
        ),
        "gobuster" => format!(
            "[MOCK] Gobuster results for {target}:\n/images (Status: 200)\n/css (Status: 200)\n/js (Status: 200)\n/admin (Status: 301)"
        ),
        "sqlmap" => format!(
            "[MOCK] Sqlmap results for {target}:\nTarget is not vulnerable to SQL injection"
        ),
        "wpscan" => format!(
            "[MOCK] WPScan results for {target}:\n[+] WordPress version 5.8 identified (Latest, released on 2021-07-20)"
        ),
        "gitleaks" => format!(
            r#"{{
  "findings": [
    {{
      "rule": "generic-secret",
      "file": "README.md",
      "startLine": 1,
      "secret": "password123",
      "message": "[MOCK] Simulated secret found in {target}"
    }}
  ]
}}"#
        ),
        "trivy-sca" => format!(
            r#"{{
  "Target": "go.mod",
  "Source": "{target}",
  "Vulnerabilities": [
    {{
      "VulnerabilityID": "CVE-2023-1234",
      "PkgName": "golang.org/x/net",
      "InstalledVersion": "v0.7.0",
      "FixedVersion": "v0.17.0",
      "Severity": "HIGH",
      "Title": "[MOCK] HTTP/2 rapid reset"
    }}
  ]
}}"#
        ),
        "semgrep" => format!(
            r#"{{
  "results": [
    {{
      "check_id": "go.lang.security.audit.xss.reflect.xss",
      "path": "main.go",
      "start": {{ "line": 1, "col": 1 }},
      "extra": {{ "message": "[MOCK] Potential XSS vulnerability detected in {target}" }}
    }}
  ]
}}"#
        ),
        "trivy-image" => format!(
            r#"{{
  "Image": "app:latest",
  "Source": "{target}",
  "OS": "alpine:3.14",
  "Vulnerabilities": [
    {{
      "ID": "CVE-2022-4567",
      "Package": "openssl",
      "Severity": "CRITICAL",
      "Title": "[MOCK] X.509 email address buffer overflow"
    }}
  ]
}}"#
        ),
        "kube-bench" => format!(
            "[MOCK] Kube-Bench results for {target}:\n\
[INFO] 1 Master Node Security Configuration\n\
[INFO] 1.1 API Server\n\
[WARN] 1.1.1 Ensure that the --anonymous-auth argument is set to false (Manual)\n\
[PASS] 1.1.2 Ensure that the --basic-auth-file argument is not set (Automated)\n\
[FAIL] 1.1.3 Ensure that the --insecure-allow-any-token argument is not set (Automated)\n\
\n\
[INFO] 2 Etcd Node Configuration\n\
[PASS] 2.1 Ensure that the --cert-file and --key-file arguments are set as appropriate (Automated)"
        ),
        "trivy-iac" => format!(
            r#"{{
  "Target": "{target}",
  "Results": [
    {{
      "Target": "main.tf",
      "Class": "config",
      "Type": "terraform",
      "MisconfSummary": {{ "Successes": 23, "Failures": 2, "Exceptions": 0 }},
      "Misconfigurations": [
        {{
          "ID": "AVD-AWS-0001",
          "Title": "S3 Bucket has public access enabled",
          "Message": "[MOCK] Bucket 'my-public-bucket' allows public access.",
          "Severity": "HIGH",
          "Status": "FAIL"
        }},
        {{
          "ID": "AVD-AWS-0107",
          "Title": "Security Group allows open ingress",
          "Message": "[MOCK] Security groups should not allow ingress from 0.0.0.0/0 to port 22",
          "Severity": "CRITICAL",
          "Status": "FAIL"
        }}
      ]
    }}
  ]
}}"#
        ),
        "infracost" => format!(
            r#"{{
  "version": "0.1",
  "currency": "USD",
  "generatedBy": "[MOCK] infracost",
  "projects": [
    {{
      "name": "{target}",
      "breakdown": {{
        "resources": [],
        "totalHourlyCost": "0.21",
        "totalMonthlyCost": "154.20"
      }}
    }}
  ],
  "totalHourlyCost": "0.21",
  "totalMonthlyCost": "154.20"
}}"#
        ),
        other => format!("[MOCK] {other} results for {target}"),
    }
}
