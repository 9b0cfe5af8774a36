//! Toggle groups in the persisted `ShaderToggler.ini` layout.
//!
//! ```ini
//! [General]
//! AmountGroups=1
//!
//! [Group0]
//! Name=Hud
//! ToggleKey=335544320
//! IsActiveAtStartup=false
//!
//! [Group0_PixelShaders]
//! AmountHashes=1
//! ShaderHash0=3735928559
//! ```
//!
//! Files written before groups existed have no `AmountGroups` and a single set of
//! `[VertexShaders]`, `[PixelShaders]` and `[ComputeShaders]` sections.

use std::path::Path;

use ahash::HashSet;
use strum::IntoEnumIterator;

use super::ini::{IniError, IniFile};
use crate::toggler::{
    key_chord::KeyChord,
    shader::{ShaderHash, ShaderStage},
    toggle_group::ToggleGroup,
};

const GENERAL_SECTION: &str = "General";
const GROUP_SECTION: &str = "Group";
const AMOUNT_GROUPS: &str = "AmountGroups";
const AMOUNT_HASHES: &str = "AmountHashes";
const NAME: &str = "Name";
const TOGGLE_KEY: &str = "ToggleKey";
const IS_ACTIVE_AT_STARTUP: &str = "IsActiveAtStartup";
const SHADER_HASH: &str = "ShaderHash";

fn group_section(index: usize) -> String {
    format!("{GROUP_SECTION}{index}")
}

fn stage_section(prefix: Option<&str>, stage: ShaderStage) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}_{stage}Shaders"),
        None => format!("{stage}Shaders"),
    }
}

/// The group created when nothing has been configured yet.
pub fn default_group() -> ToggleGroup {
    let mut group = ToggleGroup::new("");
    group.set_toggle_key_captured(KeyChord::caps_lock());
    group
}

pub fn write_groups(groups: &[ToggleGroup]) -> IniFile {
    let mut ini = IniFile::default();
    ini.set_value(AMOUNT_GROUPS, groups.len(), GENERAL_SECTION);
    for (index, group) in groups.iter().enumerate() {
        write_group(&mut ini, group, index);
    }
    ini
}

fn write_group(ini: &mut IniFile, group: &ToggleGroup, index: usize) {
    let section = group_section(index);
    ini.set_value(NAME, group.name(), &section);
    ini.set_value(TOGGLE_KEY, group.toggle_key().encode_v1(), &section);
    ini.set_value(IS_ACTIVE_AT_STARTUP, group.is_active_at_startup(), &section);

    for stage in ShaderStage::iter() {
        let stage_section = stage_section(Some(section.as_str()), stage);

        let mut hashes = group.hashes(stage).iter().copied().collect::<Vec<_>>();
        hashes.sort();

        ini.set_value(AMOUNT_HASHES, hashes.len(), &stage_section);
        for (i, hash) in hashes.iter().enumerate() {
            ini.set_value(&format!("{SHADER_HASH}{i}"), hash.0, &stage_section);
        }
    }
}

pub fn read_groups(ini: &IniFile) -> Vec<ToggleGroup> {
    let Some(amount) = ini.value(AMOUNT_GROUPS, GENERAL_SECTION) else {
        tracing::info!("No {AMOUNT_GROUPS} found, reading single group format.");
        return vec![read_legacy_group(ini)];
    };
    let amount = amount.parse::<usize>().unwrap_or_else(|_| {
        tracing::warn!("Invalid {AMOUNT_GROUPS} value: {amount}");
        0
    });

    // Only sections that exist are read, whatever the count claims.
    let mut indices = ini
        .sections()
        .filter_map(|name| {
            let index = name.strip_prefix(GROUP_SECTION)?.parse::<usize>().ok()?;
            (group_section(index) == name).then_some(index)
        })
        .filter(|index| *index < amount)
        .collect::<Vec<_>>();
    indices.sort_unstable();

    let groups = indices
        .into_iter()
        .map(|index| read_group(ini, &group_section(index)))
        .collect::<Vec<_>>();

    if groups.len() < amount {
        tracing::warn!(
            "{AMOUNT_GROUPS} is {amount}, but only {} group section(s) exist.",
            groups.len()
        );
    }

    groups
}

fn read_group(ini: &IniFile, section: &str) -> ToggleGroup {
    let mut group = ToggleGroup::new(ini.value(NAME, section).unwrap_or_default());

    let toggle_key = ini
        .get_u32(TOGGLE_KEY, section)
        .and_then(KeyChord::decode_v1)
        .unwrap_or_else(KeyChord::caps_lock);
    group.set_toggle_key_captured(toggle_key);

    let active = ini
        .get_bool(IS_ACTIVE_AT_STARTUP, section)
        .unwrap_or_default();
    group.set_active_at_startup(active);
    group.set_active(active);

    for stage in ShaderStage::iter() {
        let hashes = read_hashes(ini, &stage_section(Some(section), stage));
        group.replace_hashes(stage, hashes);
    }

    group
}

fn read_legacy_group(ini: &IniFile) -> ToggleGroup {
    let mut group = default_group();
    for stage in ShaderStage::iter() {
        group.replace_hashes(stage, read_hashes(ini, &stage_section(None, stage)));
    }
    group
}

fn read_hashes(ini: &IniFile, section: &str) -> HashSet<ShaderHash> {
    let amount = ini.get_u32(AMOUNT_HASHES, section).unwrap_or_default() as usize;

    // Walk the keys that are present instead of trusting the count.
    let mut found = 0;
    let mut hashes = HashSet::default();
    for (key, value) in ini.entries(section) {
        let Some(index) = key
            .strip_prefix(SHADER_HASH)
            .and_then(|index| index.parse::<usize>().ok())
        else {
            continue;
        };
        if index >= amount {
            continue;
        }

        found += 1;
        match value.parse::<u32>() {
            Ok(0) => {}
            Ok(hash) => {
                hashes.insert(ShaderHash(hash));
            }
            Err(_) => tracing::warn!("Invalid {key} in [{section}]: {value}"),
        }
    }

    if found < amount {
        tracing::warn!("[{section}] lists {amount} hash(es), but only {found} are present.");
    }

    hashes
}

/// Load all groups from `path`. A missing file results in a single default group.
pub fn load_groups_file(path: impl AsRef<Path>) -> Result<Vec<ToggleGroup>, IniError> {
    let path = path.as_ref();
    match IniFile::load(path) {
        Ok(ini) => {
            let groups = read_groups(&ini);
            tracing::info!("Loaded {} toggle group(s) from {}", groups.len(), path.display());
            Ok(groups)
        }
        Err(err) if err.is_not_found() => {
            tracing::info!("{} not found, starting with a default group.", path.display());
            Ok(vec![default_group()])
        }
        Err(err) => Err(err),
    }
}

pub fn save_groups_file(path: impl AsRef<Path>, groups: &[ToggleGroup]) -> Result<(), IniError> {
    let path = path.as_ref();
    write_groups(groups).save(path)?;
    tracing::info!("Saved {} toggle group(s) to {}", groups.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::toggler::key_chord::Modifiers;

    use super::*;

    fn set(values: &[u32]) -> HashSet<ShaderHash> {
        values.iter().copied().map(ShaderHash).collect()
    }

    #[test]
    fn groups_survive_a_write_and_read() {
        let mut hud = ToggleGroup::new("Hud");
        hud.set_toggle_key(0x48, Modifiers::CTRL | Modifiers::ALT);
        hud.set_active_at_startup(true);
        hud.store_collected_hashes(&set(&[1, 2]), &set(&[3]), &set(&[]));

        let mut fog = ToggleGroup::new("Fog");
        fog.set_toggle_key(0x46, Modifiers::empty());
        fog.replace_hashes(ShaderStage::Compute, set(&[0xDEAD_BEEF]));

        let text = write_groups(&[hud.clone(), fog.clone()]).to_string();
        let groups = read_groups(&IniFile::parse(&text));
        assert_eq!(groups.len(), 2);

        let read = &groups[0];
        assert_eq!(read.name(), "Hud");
        assert_eq!(read.toggle_key(), hud.toggle_key());
        assert!(read.is_active_at_startup());
        assert!(read.is_active());
        for stage in ShaderStage::iter() {
            assert_eq!(read.hashes(stage), hud.hashes(stage));
        }
        // Loaded groups get fresh ids.
        assert_ne!(read, &hud);

        let read = &groups[1];
        assert_eq!(read.name(), "Fog");
        assert!(!read.is_active());
        assert_eq!(read.hashes(ShaderStage::Compute), &set(&[0xDEAD_BEEF]));
        assert!(read.hashes(ShaderStage::Pixel).is_empty());
    }

    #[test]
    fn written_layout() {
        let mut group = ToggleGroup::new("Hud");
        group.set_toggle_key_captured(KeyChord::caps_lock());
        group.replace_hashes(ShaderStage::Pixel, set(&[20, 10]));

        let ini = write_groups(&[group]);
        assert_eq!(ini.get_u32("AmountGroups", "General"), Some(1));
        assert_eq!(ini.value("Name", "Group0"), Some("Hud"));
        assert_eq!(ini.get_u32("ToggleKey", "Group0"), Some(0x1400_0000));
        assert_eq!(ini.value("IsActiveAtStartup", "Group0"), Some("false"));
        assert_eq!(ini.get_u32("AmountHashes", "Group0_PixelShaders"), Some(2));
        assert_eq!(ini.get_u32("ShaderHash0", "Group0_PixelShaders"), Some(10));
        assert_eq!(ini.get_u32("ShaderHash1", "Group0_PixelShaders"), Some(20));
        assert_eq!(ini.get_u32("AmountHashes", "Group0_VertexShaders"), Some(0));
        assert_eq!(ini.get_u32("AmountHashes", "Group0_ComputeShaders"), Some(0));
    }

    #[test]
    fn legacy_single_group_format() {
        let ini = IniFile::parse(
            "[PixelShaders]\nAmountHashes=2\nShaderHash0=11\nShaderHash1=12\n\
             [VertexShaders]\nAmountHashes=1\nShaderHash0=21\n",
        );
        let groups = read_groups(&ini);
        assert_eq!(groups.len(), 1);

        let group = &groups[0];
        assert_eq!(group.name(), "Default");
        assert_eq!(group.toggle_key(), KeyChord::caps_lock());
        assert_eq!(group.hashes(ShaderStage::Pixel), &set(&[11, 12]));
        assert_eq!(group.hashes(ShaderStage::Vertex), &set(&[21]));
        assert!(group.hashes(ShaderStage::Compute).is_empty());
    }

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let ini = IniFile::parse(
            "[General]\nAmountGroups=1\n[Group0]\nName=\nToggleKey=0\n\
             [Group0_PixelShaders]\nAmountHashes=3\nShaderHash0=5\nShaderHash2=0\n",
        );
        let groups = read_groups(&ini);
        let group = &groups[0];
        assert_eq!(group.name(), "Default");
        assert_eq!(group.toggle_key(), KeyChord::caps_lock());
        assert!(!group.is_active_at_startup());
        assert_eq!(group.hashes(ShaderStage::Pixel), &set(&[5]));
    }

    #[test]
    fn zero_groups() {
        let ini = IniFile::parse("[General]\nAmountGroups=0\n");
        assert!(read_groups(&ini).is_empty());
    }

    #[test]
    fn unparsable_group_count_is_not_the_legacy_format() {
        let ini = IniFile::parse(
            "[General]\nAmountGroups=-1\n[PixelShaders]\nAmountHashes=1\nShaderHash0=5\n",
        );
        assert!(read_groups(&ini).is_empty());
    }

    #[test]
    fn counts_are_bounded_by_what_the_file_contains() {
        let ini = IniFile::parse(&format!(
            "[General]\nAmountGroups={}\n[Group1]\nName=Fog\n\
             [Group1_PixelShaders]\nAmountHashes={}\nShaderHash7=70\nShaderHash3=30\n\
             ShaderHash9999=1\nOther=2\n",
            u32::MAX,
            u32::MAX
        ));
        let groups = read_groups(&ini);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name(), "Fog");
        assert_eq!(groups[0].hashes(ShaderStage::Pixel), &set(&[70, 30, 1]));

        // Group indices do not have to be contiguous.
        let ini = IniFile::parse("[General]\nAmountGroups=9\n[Group8]\nName=Last\n[Group9]\n");
        let groups = read_groups(&ini);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name(), "Last");

        let ini = IniFile::parse(
            "[Group0_VertexShaders]\nAmountHashes=2\nShaderHash0=1\nShaderHash1=2\nShaderHash2=3\n",
        );
        assert_eq!(read_hashes(&ini, "Group0_VertexShaders"), set(&[1, 2]));
    }
}
