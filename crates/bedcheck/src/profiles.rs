//! mobile install profiles for resident phones.
//!
//! ios gets a web-clip `.mobileconfig` that pins the personal link to
//! the home screen full-screen; android gets a redirect page with an
//! "add to home screen" walkthrough. both embed the resident's token
//! link, so the files are personal and handled like credentials.

use std::path::Path;

use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::roster::personal_link;
use bedcheck_db::Database;

/// the ios web-clip payload for one resident.
pub fn ios_mobileconfig(name: &str, link: &str) -> String {
    let payload_uuid = Uuid::new_v4();
    let profile_uuid = Uuid::new_v4();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>PayloadContent</key>
    <array>
        <dict>
            <key>FullScreen</key>
            <true/>
            <key>IsRemovable</key>
            <true/>
            <key>Label</key>
            <string>宿舍晚點名</string>
            <key>PayloadDescription</key>
            <string>設定 Web Clip 以進行宿舍點名</string>
            <key>PayloadDisplayName</key>
            <string>宿舍晚點名 ({name})</string>
            <key>PayloadIdentifier</key>
            <string>com.bedcheck.webclip.{payload_uuid}</string>
            <key>PayloadType</key>
            <string>com.apple.webClip.managed</string>
            <key>PayloadUUID</key>
            <string>{payload_uuid}</string>
            <key>PayloadVersion</key>
            <integer>1</integer>
            <key>Precomposed</key>
            <true/>
            <key>URL</key>
            <string>{link}</string>
        </dict>
    </array>
    <key>PayloadDisplayName</key>
    <string>宿舍點名安裝檔 - {name}</string>
    <key>PayloadIdentifier</key>
    <string>com.bedcheck.profile.{profile_uuid}</string>
    <key>PayloadRemovalDisallowed</key>
    <false/>
    <key>PayloadType</key>
    <string>Configuration</string>
    <key>PayloadUUID</key>
    <string>{profile_uuid}</string>
    <key>PayloadVersion</key>
    <integer>1</integer>
</dict>
</plist>
"#
    )
}

/// the android redirect page for one resident.
pub fn android_html(name: &str, link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>宿舍晚點名安裝 - {name}</title>
    <style>
        body {{ font-family: sans-serif; text-align: center; padding: 40px 20px; background: #f0f2f5; }}
        .card {{ background: white; padding: 30px; border-radius: 15px; box-shadow: 0 4px 15px rgba(0,0,0,0.1); max-width: 400px; margin: 0 auto; }}
        .btn {{ display: block; width: 100%; padding: 15px; background: #007aff; color: white; text-decoration: none; border-radius: 10px; margin-top: 20px; font-weight: bold; }}
    </style>
</head>
<body>
    <div class="card">
        <h1>👋 哈囉，{name}</h1>
        <p>這是您的專屬點名連結。</p>
        <p>請點擊下方按鈕進入系統，然後在瀏覽器選單中選擇<strong>「加到主畫面」</strong>以完成安裝。</p>
        <a href="{link}" class="btn">🚀 進入點名系統</a>
    </div>
</body>
</html>
"#
    )
}

/// how many profile files a generation run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileReport {
    /// residents a profile pair was written for.
    pub residents: u64,

    /// total files written (two per resident).
    pub files: u64,
}

/// write an ios and android profile per bound tracked resident.
pub async fn write_profiles<D: Database>(
    db: &D,
    server_url: &str,
    out_dir: &Path,
) -> Result<ProfileReport, std::io::Error> {
    fs::create_dir_all(out_dir).await?;

    let residents = db
        .list_residents()
        .await
        .map_err(std::io::Error::other)?;

    let mut report = ProfileReport::default();
    for resident in residents {
        if !resident.tracked {
            continue;
        }
        let Some(binding) = db
            .get_binding_for_resident(resident.id)
            .await
            .map_err(std::io::Error::other)?
        else {
            continue;
        };

        let link = personal_link(server_url, &binding.token);
        let base = format!("{}_{}", resident.external_id, resident.name);

        fs::write(
            out_dir.join(format!("{base}_iOS.mobileconfig")),
            ios_mobileconfig(&resident.name, &link),
        )
        .await?;
        fs::write(
            out_dir.join(format!("{base}_Android.html")),
            android_html(&resident.name, &link),
        )
        .await?;

        report.residents += 1;
        report.files += 2;
    }

    info!(
        residents = report.residents,
        files = report.files,
        dir = %out_dir.display(),
        "mobile profiles written"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{RosterEntry, sync_roster};
    use bedcheck_db::BedcheckDb;

    #[test]
    fn test_ios_profile_embeds_link_and_name() {
        let profile = ios_mobileconfig("Chen Wei", "https://dorm.example.com/?token=abc");
        assert!(profile.contains("<string>https://dorm.example.com/?token=abc</string>"));
        assert!(profile.contains("宿舍晚點名 (Chen Wei)"));
        assert!(profile.contains("com.apple.webClip.managed"));
    }

    #[test]
    fn test_ios_profile_uuids_are_fresh() {
        let a = ios_mobileconfig("A", "https://x/?token=t");
        let b = ios_mobileconfig("A", "https://x/?token=t");
        assert_ne!(a, b);
    }

    #[test]
    fn test_android_page_redirects_to_link() {
        let page = android_html("Chen Wei", "https://dorm.example.com/?token=abc");
        assert!(page.contains(r#"href="https://dorm.example.com/?token=abc""#));
        assert!(page.contains("Chen Wei"));
    }

    #[tokio::test]
    async fn test_write_profiles_pair_per_bound_resident() {
        let db = BedcheckDb::new_in_memory().await.unwrap();
        sync_roster(
            &db,
            &[RosterEntry {
                external_id: "S001".to_string(),
                name: "Chen Wei".to_string(),
                room: "301".to_string(),
                bed: None,
                class_name: None,
                nationality: None,
                gender: None,
                tracked: true,
            }],
        )
        .await
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let report = write_profiles(&db, "https://dorm.example.com", dir.path())
            .await
            .unwrap();
        assert_eq!(report.residents, 1);
        assert_eq!(report.files, 2);

        assert!(dir.path().join("S001_Chen Wei_iOS.mobileconfig").exists());
        assert!(dir.path().join("S001_Chen Wei_Android.html").exists());
    }
}
