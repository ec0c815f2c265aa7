//! Help text for every verb.

use crate::verbs::Verb;

/// One-line description shown in the full listing.
pub fn summary(verb: Verb) -> &'static str {
    match verb {
        Verb::Active => "Mark the selected partition as bootable.",
        Verb::Add => "Add a disk to the selected RAID volume.",
        Verb::Assign => "Mount the selected volume.",
        Verb::Attach => "Attach a virtual disk file as a loop device.",
        Verb::Attributes => "Show or change disk and volume attributes.",
        Verb::Break => "Remove a disk from the selected RAID volume.",
        Verb::Clean => "Clear the partition table and signatures of the selected disk.",
        Verb::Convert => "Write a new GPT or MBR partition table.",
        Verb::Create => "Create a partition, volume or virtual disk.",
        Verb::Delete => "Delete the selected partition or volume.",
        Verb::Detach => "Detach a virtual disk file.",
        Verb::Detail => "Show details of the selected object.",
        Verb::Exit => "Exit the shell.",
        Verb::Expand => "Grow the maximum size of a virtual disk file.",
        Verb::Extend => "Grow the selected partition.",
        Verb::Filesystems => "Show the current and supported filesystems of the selected volume.",
        Verb::Format => "Create a filesystem on the selected volume.",
        Verb::Gpt => "Set GPT attributes of the selected partition.",
        Verb::Help => "Show a list of commands.",
        Verb::Inactive => "Clear the bootable flag of the selected partition.",
        Verb::List => "List disks, partitions, volumes or virtual disks.",
        Verb::Offline => "Take the selected disk or volume offline.",
        Verb::Online => "Bring the selected disk or volume online.",
        Verb::Rem => "Comment; does nothing.",
        Verb::Remove => "Unmount the selected volume.",
        Verb::Repair => "Check and repair the filesystem of the selected volume.",
        Verb::Rescan => "Re-read partition tables of all disks.",
        Verb::Select => "Move the focus to a disk, partition or volume.",
        Verb::SetId => "Change the partition type of the selected partition.",
        Verb::Shrink => "Shrink the selected partition.",
        Verb::UniqueId => "Show or set the identifier of the selected disk.",
        Verb::Automount
        | Verb::Compact
        | Verb::Dump
        | Verb::Import
        | Verb::Merge
        | Verb::Recover
        | Verb::Retain
        | Verb::San
        | Verb::Set => "Recognized, not implemented.",
    }
}

/// Usage text for `help <verb>`.
pub fn usage(verb: Verb) -> &'static str {
    match verb {
        Verb::Active => "Usage: active\n\nSets the boot flag on the selected partition.",
        Verb::Add => "Usage: add disk=<n|name>\n\nAdds the disk to the selected RAID volume.",
        Verb::Assign => {
            "Usage: assign [mount=<dir>]\n\nMounts the selected volume, by default under /mnt/<name>."
        }
        Verb::Attach => {
            "Usage: attach vdisk file=<path> [readonly]\n\nAttaches the file as a loop device and scans its partitions."
        }
        Verb::Attributes => {
            "Usage: attributes [disk|volume] [set|clear readonly]\n\nWithout set/clear, shows the current attributes."
        }
        Verb::Break => "Usage: break disk=<n|name>\n\nFails and removes the disk from the selected RAID volume.",
        Verb::Clean => {
            "Usage: clean [all]\n\nRemoves partition table and signatures from the selected disk.\nWith all, every sector is zeroed as well."
        }
        Verb::Convert => "Usage: convert gpt | convert mbr",
        Verb::Create => {
            "Usage: create partition primary|extended|logical [size=<MiB>] [start=<MiB>]\n       create partition efi [size=<MiB>] [start=<MiB>]\n       create partition msr [size=<MiB>] [start=<MiB>]\n       create volume simple|mirror|stripe|raid disk=<n>[,<n>...]\n       create vdisk file=<path> maximum=<MiB> [type=fixed|expandable]"
        }
        Verb::Delete => "Usage: delete partition [override] | delete volume",
        Verb::Detach => "Usage: detach vdisk file=<path>",
        Verb::Detail => "Usage: detail disk | detail partition | detail volume",
        Verb::Exit => "Usage: exit",
        Verb::Expand => "Usage: expand vdisk file=<path> maximum=<MiB>",
        Verb::Extend => {
            "Usage: extend [size=<MiB>]\n\nResizes the selected partition to <MiB>, or to the end of the free space."
        }
        Verb::Filesystems => "Usage: filesystems",
        Verb::Format => {
            "Usage: format [fs=<ext4|ext3|ext2|xfs|btrfs|vfat|fat32|exfat|ntfs>] [label=<text>] [quick]"
        }
        Verb::Gpt => "Usage: gpt attributes=<hex>",
        Verb::Help => "Usage: help [<command>]",
        Verb::Inactive => "Usage: inactive\n\nClears the boot flag on the selected partition.",
        Verb::List => "Usage: list disk | list partition | list volume | list vdisk",
        Verb::Offline => "Usage: offline disk | offline volume",
        Verb::Online => "Usage: online disk | online volume",
        Verb::Rem => "Usage: rem <comment>",
        Verb::Remove => "Usage: remove [mount=<dir>]\n\nUnmounts the selected volume.",
        Verb::Repair => "Usage: repair",
        Verb::Rescan => "Usage: rescan",
        Verb::Select => {
            "Usage: select disk <n|name> | select partition <n|name> | select volume <n|name>\n\nNumbers refer to the matching list command. Partition numbers count the\nselected disk's partitions when a disk is selected."
        }
        Verb::SetId => "Usage: setid id=<type>",
        Verb::Shrink => {
            "Usage: shrink size=<MiB>\n\nResizes the selected partition to <MiB>. desired= is accepted as well."
        }
        Verb::UniqueId => "Usage: uniqueid disk [id=<identifier>]",
        Verb::Automount
        | Verb::Compact
        | Verb::Dump
        | Verb::Import
        | Verb::Merge
        | Verb::Recover
        | Verb::Retain
        | Verb::San
        | Verb::Set => "This command is recognized but not implemented in Linux compatibility mode.",
    }
}

/// Listing of every verb with its summary.
pub fn full_help() -> String {
    let mut text = String::from("Available commands (Linux compatibility mode):\n\n");
    for verb in Verb::ALL {
        text.push_str(&format!("  {:<12} - {}\n", verb.name().to_uppercase(), summary(verb)));
    }
    text.push_str("\nType 'help <command>' for details on one command.\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_usage_differs_from_listing() {
        let listing = full_help();
        assert!(usage(Verb::Format).starts_with("Usage: format"));
        assert!(usage(Verb::Select).starts_with("Usage: select"));
        assert_ne!(usage(Verb::Format), listing);
        assert!(!usage(Verb::Select).contains("Available commands"));
    }

    #[test]
    fn listing_names_every_verb() {
        let listing = full_help();
        for verb in Verb::ALL {
            assert!(listing.contains(&verb.name().to_uppercase()), "{verb}");
        }
    }
}
