//! Model sources used across the integration tests.

/// Two states, one transition.
pub const LISTENER: &str = r#"
package Listening {
    attribute def StartSignal;

    state def ListenerMachine {
        entry; then Idle;
        state Idle;
        accept StartSignal then Listening;
        state Listening;
    }

    part def Listener {
        exhibit state machine : ListenerMachine;
    }
}
"#;

/// One part performing a free function and a method, interleaved.
pub const WORKER: &str = r#"
package Work {
    attribute def Begin;
    attribute def Finish;

    state def WorkerMachine {
        entry; then Ready;
        state Ready;
        accept Begin then Busy;
        state Busy;
        accept Finish then Ready;
    }

    action def Checksum {
        in data : String;
        out sum : Integer;
        rep functionBody language "TypeScript" /*
            let total = 0;
            for (const c of data) {
                total = (total + c.charCodeAt(0)) % 256;
            }
            return total;
        */
    }

    action def Start {
        in self : Worker;
        in job : String;
        rep functionBody language "TypeScript" /*
            this._job = job;
            this._dispatch('Begin');
        */
    }

    action def Describe {
        in job : String [0..1];
        out text : String;
        rep functionBody language "TypeScript" /* return job ?? 'idle'; */
    }

    action def Complete {
        in self : Worker;
        rep finish language "TypeScript" /*
            finish(): void {
              this._dispatch('Finish');
            }
        */
    }

    part def Worker {
        attribute retries : Integer = 3;
        attribute verbose : Boolean = true;
        perform action start : Start;
        perform action checksum : Checksum;
        perform action finish : Complete;
        perform action describe : Describe;
        exhibit state machine : WorkerMachine;
        rep textualRepresentation language "TypeScript" /*
            import { createHash } from 'crypto';
        */
        rep classMembers language "TypeScript" /*
            private _job: string | undefined;
        */
    }
}
"#;

/// A message-handling model split over three source units.
pub const ADAPTER_UNITS: &[(&str, &str)] = &[
    (
        "behavior.sysml",
        r#"
package AdapterBehavior {
    attribute def Connect;
    attribute def Disconnect;
    attribute def MessageReceived;
    attribute def AckSent;

    state def ReceiverMachine {
        entry; then Disconnected;
        state Disconnected;
        accept Connect then Connected;
        state Connected;
        accept MessageReceived then Processing;
        accept Disconnect then Disconnected;
        state Processing;
        accept AckSent then Connected;
        accept Disconnect then Disconnected;
    }

    state def ForwarderMachine {
        entry; then Waiting;
        state Waiting { accept MessageReceived then Sending; }
        state Sending { accept AckSent then Waiting; }
    }
}
"#,
    ),
    (
        "messages.sysml",
        r#"
package Messages {
    part def Segment {
        attribute id : String;
        attribute fields : String [*];
    }
    part def Message {
        attribute header : Segment;
        attribute body : Segment [0..*];
    }
    part def AckCode {
        rep textualRepresentation language "TypeScript" /* 'AA' | 'AE' | 'AR' */
    }
}
"#,
    ),
    (
        "components.sysml",
        r#"
package Components {
    import Messages::*;

    action def ParseMessage {
        in raw : String;
        out message : Messages::Message;
        rep functionBody language "TypeScript" /*
            const [header, ...body] = raw.split('\r').map(toSegment);
            return { header, body };
        */
    }

    action def Acknowledge {
        in self : MllpReceiver;
        in message : Messages::Message;
        out code : Messages::AckCode;
        rep functionBody language "TypeScript" /*
            this._dispatch('AckSent');
            return message.body.length > 0 ? 'AA' : 'AR';
        */
    }

    part def BaseReceiver {
        exhibit state machine : AdapterBehavior::ReceiverMachine;
    }

    part def MllpReceiver :> BaseReceiver {
        attribute host : String = "0.0.0.0";
        attribute listenPort : Integer = 2575;
        perform action parseMessage : ParseMessage;
        perform action acknowledge : Acknowledge;
    }

    part def HttpForwarder {
        attribute endpoint : String;
        attribute timeoutSeconds : Real = 2.5;
        exhibit state machine : AdapterBehavior::ForwarderMachine;
    }

    part def AuditLog {
        attribute path : String = "audit.log";
    }
}
"#,
    ),
];

/// A part with nothing to generate.
pub const PASSIVE: &str = r#"
package Passive {
    part def Bracket {
        attribute width : Real = 1.5;
    }
}
"#;

/// Attribute names that collide with keywords or need quoting.
pub const RECEIVER: &str = r#"
package Net {
    attribute def Open;

    state def Link {
        entry; then Closed;
        state Closed;
        accept Open then Opened;
        state Opened;
    }

    part def Receiver {
        attribute host : String = "localhost";
        attribute port : Integer = 2575;
        attribute state : String;
        attribute 'listen port' : Real = 1e3;
        exhibit state m : Link;
    }
}
"#;
