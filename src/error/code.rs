//! Tables of the numeric error codes a modem reports.

/// Define a module of error code constants and a lookup function.
///
/// Each entry is `<code>: <Name> => "<description>"`. The constant is named
/// after the entry in upper snake case and the description is returned by
/// the module's `description` function.
macro_rules! define_error_codes {
    (
        $(#[$attr:meta])*
        pub mod $module:ident {
            $(
                $num:literal: $name:ident => $description:literal
            ),+
            $(,)?
        }
    ) => {
        paste::paste! {
            $(#[$attr])*
            pub mod $module {
                //! The codes in numerical order are:
                #![doc =
                $( "* `" $num "`: [`" $name:snake:upper "`]\n\n" )+
                ]

                $(
                    #[doc = $description " (code `" $num "`)."]
                    pub const [< $name:snake:upper >]: u16 = $num;
                )+

                /// Get the description of an error code.
                ///
                /// If the error code is not recognized, `None` is returned.
                pub const fn description(code: u16) -> Option<&'static str> {
                    match code {
                        $(
                            $num => Some($description),
                        )+
                        _ => None,
                    }
                }
            }
        }
    };
}

define_error_codes! {
    /// Mobile equipment error codes (`+CME ERROR: <code>`).
    pub mod cme_code {
        0: PhoneFailure => "Phone failure",
        1: NoConnection => "No connection to phone",
        2: LinkReserved => "Phone adapter link reserved",
        3: NotAllowed => "Operation not allowed",
        4: NotSupported => "Operation not supported",
        5: PhSimPin => "PH-SIM PIN required (SIM lock)",
        10: SimNotInserted => "SIM not inserted",
        11: SimPin => "SIM PIN required",
        12: SimPuk => "SIM PUK required",
        13: SimFailure => "SIM failure",
        14: SimBusy => "SIM busy",
        15: SimWrong => "SIM wrong",
        16: IncorrectPassword => "Incorrect password",
        17: SimPin2 => "SIM PIN2 required",
        18: SimPuk2 => "SIM PUK2 required",
        20: MemoryFull => "Memory full",
        21: InvalidIndex => "Invalid index",
        22: NotFound => "Not found",
        23: MemoryFailure => "Memory failure",
        24: TextTooLong => "Text string too long",
        25: InvalidChars => "Invalid characters in text string",
        26: DialStringTooLong => "Dial string too long",
        27: DialStringInvalid => "Invalid characters in dial string",
        30: NoNetwork => "No network service",
        31: NetworkTimeout => "Network timeout",
        32: NetworkNotAllowed => "Network not allowed - emergency calls only",
        40: NetworkPin => "Network personal PIN required (Network lock)",
        100: Unknown => "Unknown",
        103: IllegalMs => "Illegal MS (#3)",
        106: IllegalMe => "Illegal ME (#6)",
        107: GprsNotAllowed => "GPRS services not allowed",
        111: PlmnNotAllowed => "PLMN not allowed",
        112: AreaNotAllowed => "Location area not allowed",
        113: RoamingNotAllowed => "Roaming not allowed in this area",
        132: ServiceOptionNotSupported => "Service option not supported",
        133: ServiceOptionNotSubscribed => "Requested service option not subscribed",
        134: ServiceOptionOutOfOrder => "Service option temporarily out of order",
        148: UnspecifiedGprs => "unspecified GPRS error",
        149: PdpAuthenticationFailure => "PDP authentication failure",
        150: InvalidMobileClass => "Invalid mobile class",
    }
}

define_error_codes! {
    /// Message service error codes (`+CMS ERROR: <code>`).
    pub mod cms_code {
        301: ServiceReserved => "SMS service of ME reserved",
        302: NotAllowed => "Operation not allowed",
        303: NotSupported => "Operation not supported",
        304: InvalidPduParameter => "Invalid PDU mode parameter",
        305: InvalidTextParameter => "Invalid text mode parameter",
        310: SimNotInserted => "SIM not inserted",
        311: SimPin => "SIM PIN required",
        312: PhSimPin => "PH-SIM PIN required",
        313: SimFailure => "SIM failure",
        316: SimPuk => "SIM PUK required",
        317: SimPin2 => "SIM PIN2 required",
        318: SimPuk2 => "SIM PUK2 required",
        321: InvalidMemoryIndex => "Invalid memory index",
        322: SimMemoryFull => "SIM memory full",
        330: ScAddressUnknown => "SC address unknown",
        340: NoCnmaExpected => "No +CNMA acknowledgement expected",
        500: Unknown => "Unknown error",
        512: MmEstablishmentFailure => "MM establishment failure (for SMS)",
        513: LowerLayerFailure => "Lower layer failure (for SMS)",
        514: CpError => "CP error (for SMS)",
        515: PleaseWait => "Please wait, init or command processing in progress",
        517: SimToolkitNotSupported => "SIM Toolkit facility not supported",
        518: SimToolkitIndicationNotReceived => "SIM Toolkit indication not received",
        519: ResetToActivateEchoCancellation => "Reset product to activate or change new echo cancellation algo",
        520: PlmnListAborted => "Automatic abort about get PLMN list for an incoming call",
        526: PinDeactivationForbidden => "PIN deactivation forbidden with this SIM card",
        527: RrOrMmBusy => "Please wait, RR or MM is busy. Retry your selection later",
        528: LocationUpdateFailure => "Location update failure. Emergency calls only",
        529: PlmnSelectionFailure => "PLMN selection failure. Emergency calls only",
        531: NotInFdnPhonebook => "SMS not sent: the destination is not in the FDN phonebook and FDN lock is enabled",
    }
}
